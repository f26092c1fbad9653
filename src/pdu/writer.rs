//! PDU writer module.

use std::io::Write;

use byteordered::byteorder::{BigEndian, WriteBytesExt};
use snafu::{Backtrace, ResultExt, Snafu};

use crate::pdu::text;
use crate::pdu::*;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not write PDU field `{field}`"))]
    WriteField {
        field: &'static str,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not write {bytes} reserved bytes"))]
    WriteReserved {
        bytes: u32,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not encode text field `{field}`"))]
    EncodeText {
        field: &'static str,
        source: text::DecodeTextError,
        backtrace: Backtrace,
    },

    #[snafu(display("AE title `{value}` is longer than 16 bytes"))]
    AeTitleTooLong { value: String },
}

pub type Result<T> = std::result::Result<T, Error>;

fn write_chunk_u32<W, F>(writer: &mut W, func: F) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let mut data = vec![];
    func(&mut data)?;
    writer
        .write_u32::<BigEndian>(data.len() as u32)
        .context(WriteFieldSnafu { field: "length" })?;
    writer
        .write_all(&data)
        .context(WriteFieldSnafu { field: "data" })?;
    Ok(())
}

fn write_chunk_u16<W, F>(writer: &mut W, func: F) -> Result<()>
where
    W: Write,
    F: FnOnce(&mut Vec<u8>) -> Result<()>,
{
    let mut data = vec![];
    func(&mut data)?;
    writer
        .write_u16::<BigEndian>(data.len() as u16)
        .context(WriteFieldSnafu { field: "length" })?;
    writer
        .write_all(&data)
        .context(WriteFieldSnafu { field: "data" })?;
    Ok(())
}

fn write_ae_field<W: Write>(writer: &mut W, field: &'static str, value: &str) -> Result<()> {
    let mut bytes = text::encode(value).context(EncodeTextSnafu { field })?;
    if bytes.len() > 16 {
        return AeTitleTooLongSnafu {
            value: value.to_string(),
        }
        .fail();
    }
    bytes.resize(16, b' ');
    writer
        .write_all(&bytes)
        .context(WriteFieldSnafu { field })
}

fn write_text_item<W: Write>(writer: &mut W, item_type: u8, field: &'static str, value: &str) -> Result<()> {
    writer
        .write_u8(item_type)
        .context(WriteFieldSnafu { field: "Item-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    write_chunk_u16(writer, |buf| {
        buf.extend(text::encode(value).context(EncodeTextSnafu { field })?);
        Ok(())
    })
}

/// Write a single PDU to `writer`.
pub fn write_pdu<W>(writer: &mut W, pdu: &Pdu) -> Result<()>
where
    W: Write,
{
    match pdu {
        Pdu::AssociationRQ(rq) => write_association_rq(writer, rq),
        Pdu::AssociationAC(ac) => write_association_ac(writer, ac),
        Pdu::AssociationRJ(rj) => write_association_rj(writer, rj),
        Pdu::PData { data } => write_p_data(writer, data),
        Pdu::ReleaseRQ => {
            writer
                .write_u8(0x05)
                .context(WriteFieldSnafu { field: "PDU-type" })?;
            writer
                .write_u8(0x00)
                .context(WriteReservedSnafu { bytes: 1_u32 })?;
            writer
                .write_u32::<BigEndian>(4)
                .context(WriteFieldSnafu { field: "length" })?;
            writer
                .write_u32::<BigEndian>(0)
                .context(WriteReservedSnafu { bytes: 4_u32 })
        }
        Pdu::ReleaseRP => {
            writer
                .write_u8(0x06)
                .context(WriteFieldSnafu { field: "PDU-type" })?;
            writer
                .write_u8(0x00)
                .context(WriteReservedSnafu { bytes: 1_u32 })?;
            writer
                .write_u32::<BigEndian>(4)
                .context(WriteFieldSnafu { field: "length" })?;
            writer
                .write_u32::<BigEndian>(0)
                .context(WriteReservedSnafu { bytes: 4_u32 })
        }
        Pdu::AbortRQ { source } => {
            let (source_byte, reason_byte) = source.to_u8_pair();
            writer
                .write_u8(0x07)
                .context(WriteFieldSnafu { field: "PDU-type" })?;
            writer
                .write_u8(0x00)
                .context(WriteReservedSnafu { bytes: 1_u32 })?;
            writer
                .write_u32::<BigEndian>(4)
                .context(WriteFieldSnafu { field: "length" })?;
            writer
                .write_u16::<BigEndian>(0)
                .context(WriteReservedSnafu { bytes: 2_u32 })?;
            writer
                .write_u8(source_byte)
                .context(WriteFieldSnafu { field: "Source" })?;
            writer
                .write_u8(reason_byte)
                .context(WriteFieldSnafu { field: "Reason/Diag" })
        }
        Pdu::Unknown { pdu_type, data } => {
            writer
                .write_u8(*pdu_type)
                .context(WriteFieldSnafu { field: "PDU-type" })?;
            writer
                .write_u8(0x00)
                .context(WriteReservedSnafu { bytes: 1_u32 })?;
            writer
                .write_u32::<BigEndian>(data.len() as u32)
                .context(WriteFieldSnafu { field: "length" })?;
            writer.write_all(data).context(WriteFieldSnafu { field: "data" })
        }
    }
}

fn write_association_rq<W: Write>(writer: &mut W, rq: &AssociationRQ) -> Result<()> {
    writer
        .write_u8(0x01)
        .context(WriteFieldSnafu { field: "PDU-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;

    write_chunk_u32(writer, |buf| {
        buf.write_u16::<BigEndian>(rq.protocol_version)
            .context(WriteFieldSnafu {
                field: "Protocol-version",
            })?;
        buf.write_u16::<BigEndian>(0)
            .context(WriteReservedSnafu { bytes: 2_u32 })?;
        write_ae_field(buf, "Called-AE-title", &rq.called_ae_title)?;
        write_ae_field(buf, "Calling-AE-title", &rq.calling_ae_title)?;
        buf.write_all(&[0u8; 32])
            .context(WriteReservedSnafu { bytes: 32_u32 })?;

        write_text_item(
            buf,
            0x10,
            "Application-context-name",
            &rq.application_context_name,
        )?;
        for pc in &rq.presentation_contexts {
            write_presentation_context_proposed(buf, pc)?;
        }
        write_user_variables(buf, &rq.user_variables)?;
        Ok(())
    })
}

fn write_association_ac<W: Write>(writer: &mut W, ac: &AssociationAC) -> Result<()> {
    writer
        .write_u8(0x02)
        .context(WriteFieldSnafu { field: "PDU-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;

    write_chunk_u32(writer, |buf| {
        buf.write_u16::<BigEndian>(ac.protocol_version)
            .context(WriteFieldSnafu {
                field: "Protocol-version",
            })?;
        buf.write_u16::<BigEndian>(0)
            .context(WriteReservedSnafu { bytes: 2_u32 })?;
        write_ae_field(buf, "Called-AE-title", &ac.called_ae_title)?;
        write_ae_field(buf, "Calling-AE-title", &ac.calling_ae_title)?;
        buf.write_all(&[0u8; 32])
            .context(WriteReservedSnafu { bytes: 32_u32 })?;

        write_text_item(
            buf,
            0x10,
            "Application-context-name",
            &ac.application_context_name,
        )?;
        for pc in &ac.presentation_contexts {
            write_presentation_context_result(buf, pc)?;
        }
        write_user_variables(buf, &ac.user_variables)?;
        Ok(())
    })
}

fn write_association_rj<W: Write>(writer: &mut W, rj: &AssociationRJ) -> Result<()> {
    let (source_byte, reason_byte) = rj.source.to_u8_pair();
    writer
        .write_u8(0x03)
        .context(WriteFieldSnafu { field: "PDU-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    writer
        .write_u32::<BigEndian>(4)
        .context(WriteFieldSnafu { field: "length" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    writer
        .write_u8(rj.result.to_u8())
        .context(WriteFieldSnafu { field: "Result" })?;
    writer
        .write_u8(source_byte)
        .context(WriteFieldSnafu { field: "Source" })?;
    writer
        .write_u8(reason_byte)
        .context(WriteFieldSnafu { field: "Reason/Diag." })
}

fn write_p_data<W: Write>(writer: &mut W, data: &[PDataValue]) -> Result<()> {
    let mut body = vec![];
    for value in data {
        let mut header = 0u8;
        if matches!(value.value_type, PDataValueType::Command) {
            header |= 0x01;
        }
        if value.is_last {
            header |= 0x02;
        }
        body.write_u32::<BigEndian>((value.data.len() + 2) as u32)
            .context(WriteFieldSnafu { field: "Item-Length" })?;
        body.write_u8(value.presentation_context_id)
            .context(WriteFieldSnafu {
                field: "Presentation-context-ID",
            })?;
        body.write_u8(header).context(WriteFieldSnafu {
            field: "Message Control Header",
        })?;
        body.write_all(&value.data)
            .context(WriteFieldSnafu { field: "Presentation-data-value" })?;
    }

    writer
        .write_u8(0x04)
        .context(WriteFieldSnafu { field: "PDU-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    writer
        .write_u32::<BigEndian>(body.len() as u32)
        .context(WriteFieldSnafu { field: "length" })?;
    writer.write_all(&body).context(WriteFieldSnafu { field: "data" })
}

fn write_presentation_context_proposed<W: Write>(
    writer: &mut W,
    pc: &PresentationContextProposed,
) -> Result<()> {
    writer
        .write_u8(0x20)
        .context(WriteFieldSnafu { field: "Item-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    write_chunk_u16(writer, |buf| {
        buf.write_u8(pc.id).context(WriteFieldSnafu {
            field: "Presentation-context-ID",
        })?;
        buf.write_all(&[0u8; 3])
            .context(WriteReservedSnafu { bytes: 3_u32 })?;
        write_text_item(buf, 0x30, "Abstract-syntax-name", &pc.abstract_syntax)?;
        for ts in &pc.transfer_syntaxes {
            write_text_item(buf, 0x40, "Transfer-syntax-name", ts)?;
        }
        Ok(())
    })
}

fn write_presentation_context_result<W: Write>(
    writer: &mut W,
    pc: &PresentationContextResult,
) -> Result<()> {
    writer
        .write_u8(0x21)
        .context(WriteFieldSnafu { field: "Item-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    write_chunk_u16(writer, |buf| {
        buf.write_u8(pc.id).context(WriteFieldSnafu {
            field: "Presentation-context-ID",
        })?;
        buf.write_u8(0x00)
            .context(WriteReservedSnafu { bytes: 1_u32 })?;
        buf.write_u8(pc.reason.to_u8()).context(WriteFieldSnafu {
            field: "Result/Reason",
        })?;
        buf.write_u8(0x00)
            .context(WriteReservedSnafu { bytes: 1_u32 })?;
        write_text_item(buf, 0x40, "Transfer-syntax-name", &pc.transfer_syntax)?;
        Ok(())
    })
}

fn write_user_variables<W: Write>(writer: &mut W, user_variables: &[UserVariableItem]) -> Result<()> {
    writer
        .write_u8(0x50)
        .context(WriteFieldSnafu { field: "Item-type" })?;
    writer
        .write_u8(0x00)
        .context(WriteReservedSnafu { bytes: 1_u32 })?;
    write_chunk_u16(writer, |buf| {
        for item in user_variables {
            match item {
                UserVariableItem::MaxLength(len) => {
                    buf.write_u8(0x51).context(WriteFieldSnafu { field: "Item-type" })?;
                    buf.write_u8(0x00)
                        .context(WriteReservedSnafu { bytes: 1_u32 })?;
                    buf.write_u16::<BigEndian>(4).context(WriteFieldSnafu {
                        field: "Item-length",
                    })?;
                    buf.write_u32::<BigEndian>(*len).context(WriteFieldSnafu {
                        field: "Maximum-length-received",
                    })?;
                }
                UserVariableItem::ImplementationClassUID(uid) => {
                    write_text_item(buf, 0x52, "Implementation-class-uid", uid)?;
                }
                UserVariableItem::ImplementationVersionName(name) => {
                    write_text_item(buf, 0x55, "Implementation-version-name", name)?;
                }
                UserVariableItem::Unknown(item_type, data) => {
                    buf.write_u8(*item_type)
                        .context(WriteFieldSnafu { field: "Item-type" })?;
                    buf.write_u8(0x00)
                        .context(WriteReservedSnafu { bytes: 1_u32 })?;
                    buf.write_u16::<BigEndian>(data.len() as u16)
                        .context(WriteFieldSnafu { field: "Item-length" })?;
                    buf.write_all(data)
                        .context(WriteFieldSnafu { field: "Unknown" })?;
                }
                UserVariableItem::UserIdentity(identity) => {
                    let primary_field = identity.primary_field();
                    let secondary_field = identity.secondary_field();
                    let item_length = 4 + primary_field.len() + 2 + secondary_field.len();

                    buf.write_u8(0x58).context(WriteFieldSnafu { field: "Item-type" })?;
                    buf.write_u8(0x00)
                        .context(WriteReservedSnafu { bytes: 1_u32 })?;
                    buf.write_u16::<BigEndian>(item_length as u16)
                        .context(WriteFieldSnafu { field: "Item-length" })?;
                    buf.write_u8(identity.type_code()).context(WriteFieldSnafu {
                        field: "User-identity-type",
                    })?;
                    buf.write_u8(identity.positive_response_requested() as u8)
                        .context(WriteFieldSnafu {
                            field: "Positive-response-requested",
                        })?;
                    buf.write_u16::<BigEndian>(primary_field.len() as u16)
                        .context(WriteFieldSnafu {
                            field: "Primary-field-length",
                        })?;
                    buf.write_all(&primary_field).context(WriteFieldSnafu {
                        field: "Primary-field",
                    })?;
                    buf.write_u16::<BigEndian>(secondary_field.len() as u16)
                        .context(WriteFieldSnafu {
                            field: "Secondary-field-length",
                        })?;
                    buf.write_all(&secondary_field).context(WriteFieldSnafu {
                        field: "Secondary-field",
                    })?;
                }
                UserVariableItem::UserIdentityServerResponse(response) => {
                    buf.write_u8(0x59).context(WriteFieldSnafu { field: "Item-type" })?;
                    buf.write_u8(0x00)
                        .context(WriteReservedSnafu { bytes: 1_u32 })?;
                    buf.write_u16::<BigEndian>(response.len() as u16)
                        .context(WriteFieldSnafu { field: "Item-length" })?;
                    buf.write_all(response)
                        .context(WriteFieldSnafu { field: "Server-response" })?;
                }
            }
        }
        Ok(())
    })
}
