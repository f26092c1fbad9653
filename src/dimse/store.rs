//! C-STORE, the Storage service class (PS3.7 §9.1.1, spec.md Scenario C).

use crate::error::{self, Result};
use crate::pdu::commands::{Command, Priority};
use crate::pdu::generated::{CStoreRq, CStoreRsp};

use super::connection::{receive_message, send_message, DimseConnection};
use super::message::DimseMessage;

/// Send a C-STORE-RQ with the given already-encoded dataset and wait for
/// its response, returning the response status.
#[allow(clippy::too_many_arguments)]
pub fn c_store<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    affected_sop_class_uid: &str,
    affected_sop_instance_uid: &str,
    priority: Priority,
    dataset: &[u8],
) -> Result<u16> {
    let rq = CStoreRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(affected_sop_class_uid)
        .affected_sop_instance_uid(affected_sop_instance_uid)
        .priority(priority)
        .build();
    send_message(conn, context_id, &rq.encode(true), Some(dataset))?;

    let message = receive_message(conn)?;
    message.command.status().ok_or_else(|| error::Error::ProtocolViolation {
        detail: "C-STORE-RSP is missing Status".to_string(),
    })
}

/// A received C-STORE-RQ, as seen by an acceptor.
#[derive(Debug, Clone)]
pub struct ReceivedCStore {
    pub message_id: u16,
    pub affected_sop_class_uid: String,
    pub affected_sop_instance_uid: String,
    pub dataset: Vec<u8>,
}

pub(crate) fn parse_c_store(message: DimseMessage) -> Result<ReceivedCStore> {
    let message_id = message.command.message_id().ok_or_else(|| error::Error::ProtocolViolation {
        detail: "C-STORE-RQ is missing Message ID".to_string(),
    })?;
    let affected_sop_class_uid = message
        .command
        .affected_sop_class_uid()
        .ok_or_else(|| error::Error::ProtocolViolation {
            detail: "C-STORE-RQ is missing Affected SOP Class UID".to_string(),
        })?
        .to_string();
    let affected_sop_instance_uid = message
        .command
        .affected_sop_instance_uid()
        .ok_or_else(|| error::Error::ProtocolViolation {
            detail: "C-STORE-RQ is missing Affected SOP Instance UID".to_string(),
        })?
        .to_string();
    let dataset = message.dataset.ok_or_else(|| error::Error::ProtocolViolation {
        detail: "C-STORE-RQ is missing its dataset".to_string(),
    })?;
    Ok(ReceivedCStore {
        message_id,
        affected_sop_class_uid,
        affected_sop_instance_uid,
        dataset,
    })
}

/// Block until a C-STORE-RQ arrives, returning its presentation context id
/// alongside the parsed request.
pub fn receive_c_store<C: DimseConnection>(conn: &mut C) -> Result<(u8, ReceivedCStore)> {
    let message = receive_message(conn)?;
    let context_id = message.context_id;
    Ok((context_id, parse_c_store(message)?))
}

/// Reply to a received C-STORE-RQ with the given status.
pub fn respond_c_store<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id_being_responded_to: u16,
    affected_sop_class_uid: &str,
    affected_sop_instance_uid: &str,
    status: u16,
) -> Result<()> {
    let rsp = CStoreRsp::builder()
        .message_id_being_responded_to(message_id_being_responded_to)
        .affected_sop_class_uid(affected_sop_class_uid)
        .affected_sop_instance_uid(affected_sop_instance_uid)
        .status(status)
        .build();
    send_message(conn, context_id, &rsp.encode(false), None)
}
