//! Bridges the DIMSE service layer to an established association.
//!
//! [`DimseConnection`] is implemented identically for
//! [`crate::ClientAssociation`] and [`crate::ServerAssociation`] (both are
//! thin wrappers over a `TcpStream` exposing the same `send`/`receive`/
//! `send_pdata`/`send_command_pdata` shape), so every DIMSE operation below
//! is written once and works in either role.

use std::io::Write;
use std::net::TcpStream;

use snafu::ResultExt;

use crate::association::pdata::PDataWriter;
use crate::association::{self, Association};
use crate::error::{self, Result};
use crate::pdu::{Pdu, PDataValueType};
use crate::{ClientAssociation, ServerAssociation};

use super::message::{CommandSet, DimseMessage};

/// The operations the DIMSE layer needs from an established association,
/// regardless of whether it is the requestor or the acceptor side.
pub trait DimseConnection {
    fn max_pdu_length(&self) -> u32;
    fn send_pdu(&mut self, pdu: &Pdu) -> association::Result<()>;
    fn receive_pdu(&mut self) -> association::Result<Pdu>;
    fn command_writer(&mut self, context_id: u8) -> PDataWriter<&mut TcpStream>;
    fn dataset_writer(&mut self, context_id: u8) -> PDataWriter<&mut TcpStream>;
}

impl DimseConnection for ClientAssociation {
    fn max_pdu_length(&self) -> u32 {
        self.acceptor_max_pdu_length()
    }
    fn send_pdu(&mut self, pdu: &Pdu) -> association::Result<()> {
        self.send(pdu)
    }
    fn receive_pdu(&mut self) -> association::Result<Pdu> {
        self.receive()
    }
    fn command_writer(&mut self, context_id: u8) -> PDataWriter<&mut TcpStream> {
        self.send_command_pdata(context_id)
    }
    fn dataset_writer(&mut self, context_id: u8) -> PDataWriter<&mut TcpStream> {
        self.send_pdata(context_id)
    }
}

impl DimseConnection for ServerAssociation {
    fn max_pdu_length(&self) -> u32 {
        self.acceptor_max_pdu_length()
    }
    fn send_pdu(&mut self, pdu: &Pdu) -> association::Result<()> {
        self.send(pdu)
    }
    fn receive_pdu(&mut self) -> association::Result<Pdu> {
        self.receive()
    }
    fn command_writer(&mut self, context_id: u8) -> PDataWriter<&mut TcpStream> {
        self.send_command_pdata(context_id)
    }
    fn dataset_writer(&mut self, context_id: u8) -> PDataWriter<&mut TcpStream> {
        self.send_pdata(context_id)
    }
}

/// Fold the narrower `association::Error` taxonomy into this crate's
/// stable error kinds. Only the variants a DIMSE caller needs to act on
/// differently (rejection, abort) get a precise mapping; the rest become a
/// `ProtocolViolation` carrying the original message.
pub(crate) fn map_assoc_err(err: association::Error) -> error::Error {
    match err {
        association::Error::Rejected { result, source } => error::Error::AssociationRejected { result, source },
        association::Error::Aborted { source } => error::Error::Aborted { source },
        association::Error::Receive { source } => error::Error::MalformedPdu { source },
        other => error::Error::ProtocolViolation { detail: other.to_string() },
    }
}

/// Send a DIMSE message: the command set over its own PDV stream, and the
/// dataset (if any) over a second PDV stream, both fragmented to the
/// negotiated maximum PDU size (spec.md §4.4).
pub fn send_message<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    command: &[u8],
    dataset: Option<&[u8]>,
) -> Result<()> {
    {
        let mut writer = conn.command_writer(context_id);
        writer.write_all(command).context(error::TransportSnafu)?;
    }
    if let Some(dataset) = dataset {
        let mut writer = conn.dataset_writer(context_id);
        writer.write_all(dataset).context(error::TransportSnafu)?;
    }
    Ok(())
}

/// Receive one whole DIMSE message, accumulating PDVs across as many
/// P-DATA-TF PDUs as necessary until the command (and its dataset, if the
/// command declares one) are both complete (spec.md §4.4).
pub fn receive_message<C: DimseConnection>(conn: &mut C) -> Result<DimseMessage> {
    let mut context_id: Option<u8> = None;
    let mut command_buf = Vec::new();
    let mut command_done = false;
    let mut command: Option<CommandSet> = None;
    let mut dataset_buf = Vec::new();
    let mut dataset_done = false;

    loop {
        let pdu = conn.receive_pdu().map_err(map_assoc_err)?;
        let Pdu::PData { data } = pdu else {
            return Err(error::Error::ProtocolViolation {
                detail: format!("expected P-DATA-TF while assembling a DIMSE message, got {}", pdu.kind()),
            });
        };

        for pdv in data {
            match context_id {
                None => context_id = Some(pdv.presentation_context_id),
                Some(id) if id == pdv.presentation_context_id => {}
                Some(_) => {
                    return Err(error::Error::ProtocolViolation {
                        detail: "PDV presentation context id changed mid-message".to_string(),
                    })
                }
            }

            match pdv.value_type {
                PDataValueType::Command => {
                    if command_done {
                        return Err(error::Error::ProtocolViolation {
                            detail: "received a command PDV after the command was already finalised".to_string(),
                        });
                    }
                    command_buf.extend_from_slice(&pdv.data);
                    if pdv.is_last {
                        command_done = true;
                        command = Some(CommandSet::decode(&command_buf)?);
                    }
                }
                PDataValueType::Data => {
                    if !command_done {
                        return Err(error::Error::ProtocolViolation {
                            detail: "received a dataset PDV before its command was finalised".to_string(),
                        });
                    }
                    if dataset_done {
                        return Err(error::Error::ProtocolViolation {
                            detail: "received a dataset PDV after the message was already finalised".to_string(),
                        });
                    }
                    dataset_buf.extend_from_slice(&pdv.data);
                    if pdv.is_last {
                        dataset_done = true;
                    }
                }
            }
        }

        if let Some(command) = &command {
            if !command.has_dataset() || dataset_done {
                return Ok(DimseMessage {
                    context_id: context_id.expect("set alongside command"),
                    command: command.clone(),
                    dataset: if command.has_dataset() { Some(dataset_buf) } else { None },
                });
            }
        }
    }
}
