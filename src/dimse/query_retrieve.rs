//! The streaming query/retrieve services: C-FIND, C-MOVE, C-GET
//! (spec.md §4.5, Scenario D).
//!
//! Each of these yields a sequence of Pending responses before a single
//! terminal (Success/Warning/Cancel/Failure) response. A caller drives the
//! stream by repeatedly asking "continue or cancel"; on cancellation this
//! layer sends a C-CANCEL-RQ (op 0x0FFF) and keeps draining responses until
//! the terminal one, exactly as spec.md §4.5's streaming contract requires.

use crate::error::{self, Result};
use crate::pdu::commands::{Command, Priority};
use crate::pdu::generated::{
    CFindCncl, CFindRq, CGetCncl, CGetRq, CMoveCncl, CMoveRq,
};

use super::connection::{receive_message, send_message, DimseConnection};
use super::message::SubOperationCounts;
use super::status::{classify, StatusClass};
use super::store::{self, ReceivedCStore};

/// What a caller wants to do after seeing a Pending response.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Action {
    Continue,
    Cancel,
}

/// Send a C-FIND-RQ with the given already-encoded Identifier, then drive
/// the Pending stream via `on_pending` (called once per match, with the
/// response's Identifier dataset) until a terminal status is reached.
///
/// Returns the terminal status.
pub fn c_find<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    affected_sop_class_uid: &str,
    priority: Priority,
    identifier: &[u8],
    mut on_pending: impl FnMut(&[u8]) -> Action,
) -> Result<u16> {
    let rq = CFindRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(affected_sop_class_uid)
        .priority(priority)
        .build();
    send_message(conn, context_id, &rq.encode(true), Some(identifier))?;

    loop {
        let message = receive_message(conn)?;
        let status = message.command.status().ok_or_else(|| error::Error::ProtocolViolation {
            detail: "C-FIND-RSP is missing Status".to_string(),
        })?;

        if !classify(status).is_pending() {
            return Ok(status);
        }

        let identifier = message.dataset.unwrap_or_default();
        if on_pending(&identifier) == Action::Cancel {
            let cncl = CFindCncl::builder().message_id_being_responded_to(message_id).build();
            send_message(conn, context_id, &cncl.encode(false), None)?;
        }
    }
}

/// Send a C-MOVE-RQ, then drive the Pending stream via `on_pending` (called
/// once per progress report, with the sub-operation counters) until a
/// terminal status is reached. Returns the terminal status and its final
/// sub-operation counts.
#[allow(clippy::too_many_arguments)]
pub fn c_move<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    affected_sop_class_uid: &str,
    priority: Priority,
    move_destination: &str,
    identifier: &[u8],
    mut on_pending: impl FnMut(SubOperationCounts) -> Action,
) -> Result<(u16, SubOperationCounts)> {
    let rq = CMoveRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(affected_sop_class_uid)
        .priority(priority)
        .move_destination(move_destination)
        .build();
    send_message(conn, context_id, &rq.encode(true), Some(identifier))?;

    loop {
        let message = receive_message(conn)?;
        let status = message.command.status().ok_or_else(|| error::Error::ProtocolViolation {
            detail: "C-MOVE-RSP is missing Status".to_string(),
        })?;
        let counts = message.command.sub_operation_counts();

        if !classify(status).is_pending() {
            return Ok((status, counts));
        }

        if on_pending(counts) == Action::Cancel {
            let cncl = CMoveCncl::builder().message_id_being_responded_to(message_id).build();
            send_message(conn, context_id, &cncl.encode(false), None)?;
        }
    }
}

/// Send a C-GET-RQ, then drive the resulting event stream: C-STORE-RQ
/// sub-operations are answered via `store_handler` (returning the status to
/// reply with), and Pending progress reports go through `on_pending`.
/// Returns the terminal status and its final sub-operation counts.
#[allow(clippy::too_many_arguments)]
pub fn c_get<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    affected_sop_class_uid: &str,
    priority: Priority,
    identifier: &[u8],
    mut on_pending: impl FnMut(SubOperationCounts) -> Action,
    mut store_handler: impl FnMut(&ReceivedCStore) -> u16,
) -> Result<(u16, SubOperationCounts)> {
    let rq = CGetRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(affected_sop_class_uid)
        .priority(priority)
        .build();
    send_message(conn, context_id, &rq.encode(true), Some(identifier))?;

    loop {
        let message = receive_message(conn)?;

        if message.command.command_field_raw() == Some(crate::pdu::commands::CommandField::C_STORE_RQ as u16) {
            let sub_context_id = message.context_id;
            let received = store::parse_c_store(message)?;
            let status = store_handler(&received);
            store::respond_c_store(
                conn,
                sub_context_id,
                received.message_id,
                &received.affected_sop_class_uid,
                &received.affected_sop_instance_uid,
                status,
            )?;
            continue;
        }

        let status = message.command.status().ok_or_else(|| error::Error::ProtocolViolation {
            detail: "C-GET-RSP is missing Status".to_string(),
        })?;
        let counts = message.command.sub_operation_counts();

        if !matches!(classify(status), StatusClass::Pending) {
            return Ok((status, counts));
        }

        if on_pending(counts) == Action::Cancel {
            let cncl = CGetCncl::builder().message_id_being_responded_to(message_id).build();
            send_message(conn, context_id, &cncl.encode(false), None)?;
        }
    }
}
