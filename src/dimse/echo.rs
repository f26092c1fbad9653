//! C-ECHO, the Verification SOP Class (PS3.7 §9.1.5, spec.md Scenario A).

use crate::error::{self, Result};
use crate::pdu::commands::Command;
use crate::pdu::generated::{CEchoRq, CEchoRsp};
use crate::uids;

use super::connection::{receive_message, send_message, DimseConnection};

/// Send a C-ECHO-RQ over `context_id` and wait for its response, returning
/// the response status (`0x0000` on success).
pub fn c_echo<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    affected_sop_class_uid: &str,
) -> Result<u16> {
    let rq = CEchoRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(affected_sop_class_uid)
        .build();
    send_message(conn, context_id, &rq.encode(false), None)?;

    let message = receive_message(conn)?;
    message.command.status().ok_or_else(|| error::Error::ProtocolViolation {
        detail: "C-ECHO-RSP is missing Status".to_string(),
    })
}

/// Convenience wrapper around [`c_echo`] for the Verification SOP Class.
pub fn verify<C: DimseConnection>(conn: &mut C, context_id: u8, message_id: u16) -> Result<u16> {
    c_echo(conn, context_id, message_id, uids::VERIFICATION)
}

/// A received C-ECHO-RQ, as seen by an acceptor.
#[derive(Debug, Clone)]
pub struct ReceivedCEcho {
    pub message_id: u16,
    pub affected_sop_class_uid: String,
}

/// Block until a C-ECHO-RQ arrives on the connection.
pub fn receive_c_echo<C: DimseConnection>(conn: &mut C) -> Result<(u8, ReceivedCEcho)> {
    let message = receive_message(conn)?;
    let message_id = message.command.message_id().ok_or_else(|| error::Error::ProtocolViolation {
        detail: "C-ECHO-RQ is missing Message ID".to_string(),
    })?;
    let affected_sop_class_uid = message
        .command
        .affected_sop_class_uid()
        .unwrap_or(uids::VERIFICATION)
        .to_string();
    Ok((
        message.context_id,
        ReceivedCEcho {
            message_id,
            affected_sop_class_uid,
        },
    ))
}

/// Reply to a received C-ECHO-RQ with the given status (`0x0000` for
/// success, per spec.md Scenario A).
pub fn respond_c_echo<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id_being_responded_to: u16,
    affected_sop_class_uid: &str,
    status: u16,
) -> Result<()> {
    let rsp = CEchoRsp::builder()
        .message_id_being_responded_to(message_id_being_responded_to)
        .affected_sop_class_uid(affected_sop_class_uid)
        .status(status)
        .build();
    send_message(conn, context_id, &rsp.encode(false), None)
}
