//! PDU reader module.

use std::io::{Cursor, ErrorKind, Read, Seek, SeekFrom};

use byteordered::byteorder::{BigEndian, ReadBytesExt};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};

use crate::pdu::text;
use crate::pdu::*;

pub use crate::pdu::{MAXIMUM_PDU_SIZE, MINIMUM_PDU_SIZE};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("invalid max PDU length {max_pdu_length}"))]
    InvalidMaxPdu {
        max_pdu_length: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("no PDU available"))]
    NoPduAvailable { backtrace: Backtrace },

    #[snafu(display("could not read PDU"))]
    ReadPdu {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not read PDU item"))]
    ReadPduItem {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not read PDU field `{field}`"))]
    ReadPduField {
        field: &'static str,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("invalid item length {length} (must be >= 2)"))]
    InvalidItemLength { length: u32, backtrace: Backtrace },

    #[snafu(display("could not read {bytes} reserved bytes"))]
    ReadReserved {
        bytes: u32,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("incoming PDU was too large: length {pdu_length}, maximum is {max_pdu_length}"))]
    PduTooLarge {
        pdu_length: u32,
        max_pdu_length: u32,
        backtrace: Backtrace,
    },

    #[snafu(display("PDU contained an invalid value {var_item:?}"))]
    InvalidPduVariable {
        var_item: PduVariableItem,
        backtrace: Backtrace,
    },

    #[snafu(display("multiple transfer syntaxes were accepted"))]
    MultipleTransferSyntaxesAccepted { backtrace: Backtrace },

    #[snafu(display("invalid reject source or reason"))]
    InvalidRejectSourceOrReason { backtrace: Backtrace },

    #[snafu(display("invalid abort service provider source or reason"))]
    InvalidAbortSourceOrReason { backtrace: Backtrace },

    #[snafu(display("invalid presentation context result reason"))]
    InvalidPresentationContextResultReason { backtrace: Backtrace },

    #[snafu(display("invalid transfer syntax sub-item"))]
    InvalidTransferSyntaxSubItem { backtrace: Backtrace },

    #[snafu(display("could not decode text field `{field}`"))]
    DecodeText {
        field: &'static str,
        source: text::DecodeTextError,
        backtrace: Backtrace,
    },

    #[snafu(display("missing application context name"))]
    MissingApplicationContextName { backtrace: Backtrace },

    #[snafu(display("missing abstract syntax"))]
    MissingAbstractSyntax { backtrace: Backtrace },

    #[snafu(display("missing transfer syntax"))]
    MissingTransferSyntax { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Read a single PDU from `reader`, enforcing `max_pdu_length` as the
/// largest value accepted (or merely warned about, when `strict` is false).
pub fn read_pdu<R>(reader: &mut R, max_pdu_length: u32, strict: bool) -> Result<Pdu>
where
    R: Read,
{
    ensure!(
        (MINIMUM_PDU_SIZE..=MAXIMUM_PDU_SIZE).contains(&max_pdu_length),
        InvalidMaxPduSnafu { max_pdu_length }
    );

    // A short read here (rather than mid-PDU) means the peer closed the
    // connection cleanly between messages, which callers treat differently
    // from a genuine I/O error.
    let mut bytes = [0; 2];
    if let Err(e) = reader.read_exact(&mut bytes) {
        ensure!(e.kind() != ErrorKind::UnexpectedEof, NoPduAvailableSnafu);
        return Err(e).context(ReadPduFieldSnafu { field: "type" });
    }

    let pdu_type = bytes[0];
    let pdu_length = reader
        .read_u32::<BigEndian>()
        .context(ReadPduFieldSnafu { field: "length" })?;

    if strict {
        ensure!(
            pdu_length <= max_pdu_length,
            PduTooLargeSnafu {
                pdu_length,
                max_pdu_length,
            }
        );
    } else if pdu_length > max_pdu_length {
        ensure!(
            pdu_length <= MAXIMUM_PDU_SIZE,
            PduTooLargeSnafu {
                pdu_length,
                max_pdu_length: MAXIMUM_PDU_SIZE,
            }
        );
        tracing::warn!(
            pdu_length,
            max_pdu_length,
            "incoming PDU exceeds the negotiated maximum, accepting non-strictly"
        );
    }

    let bytes = read_n(reader, pdu_length as usize).context(ReadPduSnafu)?;
    let mut cursor = Cursor::new(bytes);

    match pdu_type {
        0x01 => read_association_rq(&mut cursor),
        0x02 => read_association_ac(&mut cursor),
        0x03 => read_association_rj(&mut cursor),
        0x04 => read_p_data(&mut cursor),
        0x05 => {
            cursor
                .seek(SeekFrom::Current(4))
                .context(ReadReservedSnafu { bytes: 4_u32 })?;
            Ok(Pdu::ReleaseRQ)
        }
        0x06 => {
            cursor
                .seek(SeekFrom::Current(4))
                .context(ReadReservedSnafu { bytes: 4_u32 })?;
            Ok(Pdu::ReleaseRP)
        }
        0x07 => read_abort_rq(&mut cursor),
        _ => {
            let data = read_n(&mut cursor, pdu_length as usize)
                .context(ReadPduFieldSnafu { field: "Unknown" })?;
            tracing::warn!(pdu_type, "unrecognized PDU type, keeping raw bytes");
            Ok(Pdu::Unknown { pdu_type, data })
        }
    }
}

fn read_association_rq(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let mut application_context_name: Option<String> = None;
    let mut presentation_contexts = vec![];
    let mut user_variables = vec![];

    let protocol_version = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Protocol-version",
    })?;
    cursor
        .read_u16::<BigEndian>()
        .context(ReadReservedSnafu { bytes: 2_u32 })?;

    let called_ae_title = read_ae_field(cursor, "Called-AE-title")?;
    let calling_ae_title = read_ae_field(cursor, "Calling-AE-title")?;

    cursor
        .seek(SeekFrom::Current(32))
        .context(ReadReservedSnafu { bytes: 32_u32 })?;

    while cursor.position() < cursor.get_ref().len() as u64 {
        match read_pdu_variable(cursor)? {
            PduVariableItem::ApplicationContext(val) => {
                application_context_name = Some(val);
            }
            PduVariableItem::PresentationContextProposed(val) => {
                presentation_contexts.push(val);
            }
            PduVariableItem::UserVariables(val) => {
                user_variables = val;
            }
            var_item => return InvalidPduVariableSnafu { var_item }.fail(),
        }
    }

    Ok(Pdu::AssociationRQ(AssociationRQ {
        protocol_version,
        application_context_name: application_context_name
            .context(MissingApplicationContextNameSnafu)?,
        called_ae_title,
        calling_ae_title,
        presentation_contexts,
        user_variables,
    }))
}

fn read_association_ac(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let mut application_context_name: Option<String> = None;
    let mut presentation_contexts = vec![];
    let mut user_variables = vec![];

    let protocol_version = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Protocol-version",
    })?;
    cursor
        .read_u16::<BigEndian>()
        .context(ReadReservedSnafu { bytes: 2_u32 })?;

    // Echoed AE titles; not re-validated per the standard.
    let called_ae_title = read_ae_field(cursor, "Called-AE-title")?;
    let calling_ae_title = read_ae_field(cursor, "Calling-AE-title")?;

    cursor
        .seek(SeekFrom::Current(32))
        .context(ReadReservedSnafu { bytes: 32_u32 })?;

    while cursor.position() < cursor.get_ref().len() as u64 {
        match read_pdu_variable(cursor)? {
            PduVariableItem::ApplicationContext(val) => {
                application_context_name = Some(val);
            }
            PduVariableItem::PresentationContextResult(val) => {
                presentation_contexts.push(val);
            }
            PduVariableItem::UserVariables(val) => {
                user_variables = val;
            }
            var_item => return InvalidPduVariableSnafu { var_item }.fail(),
        }
    }

    Ok(Pdu::AssociationAC(AssociationAC {
        protocol_version,
        application_context_name: application_context_name
            .context(MissingApplicationContextNameSnafu)?,
        called_ae_title,
        calling_ae_title,
        presentation_contexts,
        user_variables,
    }))
}

fn read_ae_field(cursor: &mut Cursor<Vec<u8>>, field: &'static str) -> Result<String> {
    let mut ae_bytes = [0; 16];
    cursor
        .read_exact(&mut ae_bytes)
        .context(ReadPduFieldSnafu { field })?;
    Ok(text::decode(&ae_bytes)
        .context(DecodeTextSnafu { field })?
        .trim()
        .to_string())
}

fn read_association_rj(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;

    let result = AssociationRJResult::from_u8(
        cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Result" })?,
    )
    .context(InvalidRejectSourceOrReasonSnafu)?;

    let source_byte = cursor
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Source" })?;
    let reason_byte = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "Reason/Diag.",
    })?;
    let source = AssociationRJSource::from_u8(source_byte, reason_byte)
        .context(InvalidRejectSourceOrReasonSnafu)?;

    Ok(Pdu::AssociationRJ(AssociationRJ { result, source }))
}

fn read_p_data(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let mut values = vec![];
    while cursor.position() < cursor.get_ref().len() as u64 {
        let item_length = cursor.read_u32::<BigEndian>().context(ReadPduFieldSnafu {
            field: "Item-Length",
        })?;
        ensure!(
            item_length >= 2,
            InvalidItemLengthSnafu {
                length: item_length
            }
        );

        let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
            field: "Presentation-context-ID",
        })?;

        let header = cursor.read_u8().context(ReadPduFieldSnafu {
            field: "Message Control Header",
        })?;
        let value_type = if header & 0x01 > 0 {
            PDataValueType::Command
        } else {
            PDataValueType::Data
        };
        let is_last = (header & 0x02) > 0;

        let data = read_n(cursor, (item_length - 2) as usize).context(ReadPduFieldSnafu {
            field: "Presentation-data-value",
        })?;

        values.push(PDataValue {
            presentation_context_id,
            value_type,
            is_last,
            data,
        });
    }

    Ok(Pdu::PData { data: values })
}

fn read_abort_rq(cursor: &mut Cursor<Vec<u8>>) -> Result<Pdu> {
    let mut buf = [0u8; 2];
    cursor
        .read_exact(&mut buf)
        .context(ReadReservedSnafu { bytes: 2_u32 })?;

    let source_byte = cursor
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Source" })?;
    let reason_byte = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "Reason/Diag",
    })?;
    let source =
        AbortRQSource::from_u8(source_byte, reason_byte).context(InvalidAbortSourceOrReasonSnafu)?;

    Ok(Pdu::AbortRQ { source })
}

fn read_n<R>(reader: &mut R, bytes_to_read: usize) -> std::io::Result<Vec<u8>>
where
    R: Read,
{
    let mut result = Vec::new();
    reader.take(bytes_to_read as u64).read_to_end(&mut result)?;
    Ok(result)
}

fn read_pdu_variable(reader: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let item_type = reader
        .read_u8()
        .context(ReadPduFieldSnafu { field: "Item-type" })?;
    reader
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;
    let item_length = reader.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Item-length",
    })?;

    let bytes = read_n(reader, item_length as usize).context(ReadPduItemSnafu)?;
    let mut cursor = Cursor::new(bytes);

    match item_type {
        0x10 => {
            let val = text::decode(&cursor.into_inner()).context(DecodeTextSnafu {
                field: "Application-context-name",
            })?;
            Ok(PduVariableItem::ApplicationContext(val.trim().to_string()))
        }
        0x20 => read_presentation_context_proposed(&mut cursor),
        0x21 => read_presentation_context_result(&mut cursor),
        0x50 => read_user_information(&mut cursor),
        _ => {
            tracing::warn!(item_type, "unrecognized PDU sub-item, skipping");
            Ok(PduVariableItem::Unknown(item_type))
        }
    }
}

fn read_sub_item_text(cursor: &mut Cursor<Vec<u8>>, field: &'static str) -> Result<String> {
    let item_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
        field: "Item-length",
    })?;
    let bytes = read_n(cursor, item_length as usize).context(ReadPduFieldSnafu { field })?;
    Ok(text::decode(&bytes)
        .context(DecodeTextSnafu { field })?
        .trim()
        .to_string())
}

fn read_presentation_context_proposed(cursor: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let mut abstract_syntax: Option<String> = None;
    let mut transfer_syntaxes = vec![];

    let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "Presentation-context-ID",
    })?;
    for _ in 0..3 {
        cursor
            .read_u8()
            .context(ReadReservedSnafu { bytes: 1_u32 })?;
    }

    while cursor.position() < cursor.get_ref().len() as u64 {
        let item_type = cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Item-type" })?;
        cursor
            .read_u8()
            .context(ReadReservedSnafu { bytes: 1_u32 })?;

        match item_type {
            0x30 => abstract_syntax = Some(read_sub_item_text(cursor, "Abstract-syntax-name")?),
            0x40 => transfer_syntaxes.push(read_sub_item_text(cursor, "Transfer-syntax-name")?),
            _ => return InvalidTransferSyntaxSubItemSnafu.fail(),
        }
    }

    Ok(PduVariableItem::PresentationContextProposed(
        PresentationContextProposed {
            id: presentation_context_id,
            abstract_syntax: abstract_syntax.context(MissingAbstractSyntaxSnafu)?,
            transfer_syntaxes,
        },
    ))
}

fn read_presentation_context_result(cursor: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let mut transfer_syntax: Option<String> = None;

    let presentation_context_id = cursor.read_u8().context(ReadPduFieldSnafu {
        field: "Presentation-context-ID",
    })?;
    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;
    let reason = PresentationContextResultReason::from_u8(cursor.read_u8().context(
        ReadPduFieldSnafu {
            field: "Result/Reason",
        },
    )?)
    .context(InvalidPresentationContextResultReasonSnafu)?;
    cursor
        .read_u8()
        .context(ReadReservedSnafu { bytes: 1_u32 })?;

    while cursor.position() < cursor.get_ref().len() as u64 {
        let item_type = cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Item-type" })?;
        cursor
            .read_u8()
            .context(ReadReservedSnafu { bytes: 1_u32 })?;

        match item_type {
            0x40 => {
                ensure!(
                    transfer_syntax.is_none(),
                    MultipleTransferSyntaxesAcceptedSnafu
                );
                transfer_syntax = Some(read_sub_item_text(cursor, "Transfer-syntax-name")?);
            }
            _ => return InvalidTransferSyntaxSubItemSnafu.fail(),
        }
    }

    Ok(PduVariableItem::PresentationContextResult(
        PresentationContextResult {
            id: presentation_context_id,
            reason,
            transfer_syntax: transfer_syntax.context(MissingTransferSyntaxSnafu)?,
        },
    ))
}

fn read_user_information(cursor: &mut Cursor<Vec<u8>>) -> Result<PduVariableItem> {
    let mut user_variables = vec![];

    while cursor.position() < cursor.get_ref().len() as u64 {
        let item_type = cursor
            .read_u8()
            .context(ReadPduFieldSnafu { field: "Item-type" })?;
        cursor
            .read_u8()
            .context(ReadReservedSnafu { bytes: 1_u32 })?;
        let item_length = cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
            field: "Item-length",
        })?;

        match item_type {
            0x51 => {
                user_variables.push(UserVariableItem::MaxLength(cursor.read_u32::<BigEndian>().context(
                    ReadPduFieldSnafu {
                        field: "Maximum-length-received",
                    },
                )?));
            }
            0x52 => {
                let bytes = read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                    field: "Implementation-class-uid",
                })?;
                let uid = text::decode(&bytes)
                    .context(DecodeTextSnafu {
                        field: "Implementation-class-uid",
                    })?
                    .trim()
                    .to_string();
                user_variables.push(UserVariableItem::ImplementationClassUID(uid));
            }
            0x55 => {
                let bytes = read_n(cursor, item_length as usize).context(ReadPduFieldSnafu {
                    field: "Implementation-version-name",
                })?;
                let name = text::decode(&bytes)
                    .context(DecodeTextSnafu {
                        field: "Implementation-version-name",
                    })?
                    .trim()
                    .to_string();
                user_variables.push(UserVariableItem::ImplementationVersionName(name));
            }
            0x58 => {
                let user_identity_type =
                    cursor.read_u8().context(ReadPduFieldSnafu {
                        field: "User-identity-type",
                    })?;
                let positive_response_requested =
                    cursor.read_u8().context(ReadPduFieldSnafu {
                        field: "Positive-response-requested",
                    })? != 0;
                let primary_field_length =
                    cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
                        field: "Primary-field-length",
                    })?;
                let primary_field = read_n(cursor, primary_field_length as usize)
                    .context(ReadPduFieldSnafu {
                        field: "Primary-field",
                    })?;
                let secondary_field_length =
                    cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
                        field: "Secondary-field-length",
                    })?;
                let secondary_field = read_n(cursor, secondary_field_length as usize)
                    .context(ReadPduFieldSnafu {
                        field: "Secondary-field",
                    })?;

                let identity = match user_identity_type {
                    1 => UserIdentity::Username {
                        username: text::decode(&primary_field).context(DecodeTextSnafu {
                            field: "User-identity-primary-field",
                        })?,
                        positive_response_requested,
                    },
                    2 => UserIdentity::UsernamePasscode {
                        username: text::decode(&primary_field).context(DecodeTextSnafu {
                            field: "User-identity-primary-field",
                        })?,
                        passcode: text::decode(&secondary_field).context(DecodeTextSnafu {
                            field: "User-identity-secondary-field",
                        })?,
                        positive_response_requested,
                    },
                    3 => UserIdentity::KerberosServiceTicket {
                        ticket: primary_field,
                        positive_response_requested,
                    },
                    4 => UserIdentity::SamlAssertion {
                        assertion: primary_field,
                        positive_response_requested,
                    },
                    5 => UserIdentity::Jwt {
                        token: primary_field,
                        positive_response_requested,
                    },
                    _ => {
                        tracing::warn!(
                            user_identity_type,
                            "unrecognized user identity type, skipping"
                        );
                        user_variables.push(UserVariableItem::Unknown(item_type, Vec::new()));
                        continue;
                    }
                };
                user_variables.push(UserVariableItem::UserIdentity(identity));
            }
            0x59 => {
                // User Identity Server Response: a single response-field.
                // Not surfaced as a distinct user variable, only consumed
                // when present on an A-ASSOCIATE-AC; retained as raw bytes.
                let response_field_length =
                    cursor.read_u16::<BigEndian>().context(ReadPduFieldSnafu {
                        field: "Server-response-length",
                    })?;
                let response_field = read_n(cursor, response_field_length as usize)
                    .context(ReadPduFieldSnafu {
                        field: "Server-response",
                    })?;
                user_variables.push(UserVariableItem::UserIdentityServerResponse(response_field));
            }
            _ => {
                tracing::warn!(item_type, "unrecognized user information sub-item, skipping");
                user_variables.push(UserVariableItem::Unknown(
                    item_type,
                    read_n(cursor, item_length as usize)
                        .context(ReadPduFieldSnafu { field: "Unknown" })?,
                ));
            }
        }
    }

    Ok(PduVariableItem::UserVariables(user_variables))
}
