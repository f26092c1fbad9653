//! Generic DIMSE-N request/response plumbing (N-CREATE/N-SET/N-GET/
//! N-ACTION/N-DELETE), used directly by [`crate::print`] to drive the print
//! SOP instance tree, and usable by any other normalized SOP class.
//!
//! Unlike the C-services, none of the N-services stream; each is a single
//! request followed by a single response.

use dicom_core::Tag;

use crate::error::{self, Result};
use crate::pdu::commands::Command;
use crate::pdu::commands_n::{
    NActionRq, NActionRsp, NCreateRq, NCreateRsp, NDeleteRq, NDeleteRsp, NGetRq, NGetRsp, NSetRq, NSetRsp,
};

use super::connection::{receive_message, send_message, DimseConnection};

/// A decoded N-service response common to all five operations.
#[derive(Debug, Clone)]
pub struct NResponse {
    pub status: u16,
    pub affected_sop_class_uid: Option<String>,
    pub affected_sop_instance_uid: Option<String>,
    pub dataset: Option<Vec<u8>>,
}

fn read_response<C: DimseConnection>(conn: &mut C) -> Result<NResponse> {
    let message = receive_message(conn)?;
    let status = message.command.status().ok_or_else(|| error::Error::ProtocolViolation {
        detail: "N-service response is missing Status".to_string(),
    })?;
    Ok(NResponse {
        status,
        affected_sop_class_uid: message.command.affected_sop_class_uid().map(str::to_string),
        affected_sop_instance_uid: message.command.affected_sop_instance_uid().map(str::to_string),
        dataset: message.dataset,
    })
}

/// N-CREATE-RQ: create a new instance of `affected_sop_class_uid`, letting
/// the acceptor assign the SOP Instance UID when `affected_sop_instance_uid`
/// is `None` (spec.md §4.5 N-CREATE notes).
pub fn n_create<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    affected_sop_class_uid: &str,
    affected_sop_instance_uid: Option<&str>,
    dataset: Option<&[u8]>,
) -> Result<NResponse> {
    let rq = NCreateRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(affected_sop_class_uid)
        .maybe_affected_sop_instance_uid(affected_sop_instance_uid)
        .build();
    send_message(conn, context_id, &rq.encode(dataset.is_some()), dataset)?;
    read_response(conn)
}

/// N-SET-RQ: modify an existing instance with the given attribute-value
/// modification list.
pub fn n_set<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    requested_sop_class_uid: &str,
    requested_sop_instance_uid: &str,
    modification_list: &[u8],
) -> Result<NResponse> {
    let rq = NSetRq::builder()
        .message_id(message_id)
        .requested_sop_class_uid(requested_sop_class_uid)
        .requested_sop_instance_uid(requested_sop_instance_uid)
        .build();
    send_message(conn, context_id, &rq.encode(true), Some(modification_list))?;
    read_response(conn)
}

/// N-GET-RQ: retrieve attributes of an existing instance. An empty
/// `attribute_identifier_list` requests all attributes.
pub fn n_get<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    requested_sop_class_uid: &str,
    requested_sop_instance_uid: &str,
    attribute_identifier_list: Vec<Tag>,
) -> Result<NResponse> {
    let rq = NGetRq::builder()
        .message_id(message_id)
        .requested_sop_class_uid(requested_sop_class_uid)
        .requested_sop_instance_uid(requested_sop_instance_uid)
        .attribute_identifier_list(attribute_identifier_list)
        .build();
    send_message(conn, context_id, &rq.encode(false), None)?;
    read_response(conn)
}

/// N-ACTION-RQ: invoke `action_type_id` on an existing instance (e.g. "Print",
/// Action Type ID 1, on a Basic Film Box; spec.md Scenario F).
pub fn n_action<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    requested_sop_class_uid: &str,
    requested_sop_instance_uid: &str,
    action_type_id: u16,
    action_information: Option<&[u8]>,
) -> Result<NResponse> {
    let rq = NActionRq::builder()
        .message_id(message_id)
        .requested_sop_class_uid(requested_sop_class_uid)
        .requested_sop_instance_uid(requested_sop_instance_uid)
        .action_type_id(action_type_id)
        .build();
    send_message(conn, context_id, &rq.encode(action_information.is_some()), action_information)?;
    read_response(conn)
}

/// N-DELETE-RQ: delete an existing instance. Idempotent on the acceptor
/// side: a Success status is acceptable even if the instance is already
/// absent (spec.md §4.5).
pub fn n_delete<C: DimseConnection>(
    conn: &mut C,
    context_id: u8,
    message_id: u16,
    requested_sop_class_uid: &str,
    requested_sop_instance_uid: &str,
) -> Result<NResponse> {
    let rq = NDeleteRq::builder()
        .message_id(message_id)
        .requested_sop_class_uid(requested_sop_class_uid)
        .requested_sop_instance_uid(requested_sop_instance_uid)
        .build();
    send_message(conn, context_id, &rq.encode(false), None)?;
    read_response(conn)
}

/// Reply to a received N-service request with a response of the matching
/// kind. The acceptor-side counterparts are kept together here since they
/// share the same field shape across all five operations.
pub struct NResponder;

impl NResponder {
    pub fn n_create<C: DimseConnection>(
        conn: &mut C,
        context_id: u8,
        message_id_being_responded_to: u16,
        affected_sop_class_uid: &str,
        affected_sop_instance_uid: &str,
        status: u16,
        dataset: Option<&[u8]>,
    ) -> Result<()> {
        let rsp = NCreateRsp::builder()
            .message_id_being_responded_to(message_id_being_responded_to)
            .affected_sop_class_uid(affected_sop_class_uid)
            .affected_sop_instance_uid(affected_sop_instance_uid)
            .status(status)
            .build();
        send_message(conn, context_id, &rsp.encode(dataset.is_some()), dataset)
    }

    pub fn n_set<C: DimseConnection>(
        conn: &mut C,
        context_id: u8,
        message_id_being_responded_to: u16,
        affected_sop_class_uid: &str,
        affected_sop_instance_uid: &str,
        status: u16,
    ) -> Result<()> {
        let rsp = NSetRsp::builder()
            .message_id_being_responded_to(message_id_being_responded_to)
            .affected_sop_class_uid(affected_sop_class_uid)
            .affected_sop_instance_uid(affected_sop_instance_uid)
            .status(status)
            .build();
        send_message(conn, context_id, &rsp.encode(false), None)
    }

    pub fn n_get<C: DimseConnection>(
        conn: &mut C,
        context_id: u8,
        message_id_being_responded_to: u16,
        affected_sop_class_uid: &str,
        affected_sop_instance_uid: &str,
        status: u16,
        dataset: &[u8],
    ) -> Result<()> {
        let rsp = NGetRsp::builder()
            .message_id_being_responded_to(message_id_being_responded_to)
            .affected_sop_class_uid(affected_sop_class_uid)
            .affected_sop_instance_uid(affected_sop_instance_uid)
            .status(status)
            .build();
        send_message(conn, context_id, &rsp.encode(true), Some(dataset))
    }

    pub fn n_action<C: DimseConnection>(
        conn: &mut C,
        context_id: u8,
        message_id_being_responded_to: u16,
        affected_sop_class_uid: &str,
        affected_sop_instance_uid: &str,
        action_type_id: u16,
        status: u16,
        action_reply: Option<&[u8]>,
    ) -> Result<()> {
        let rsp = NActionRsp::builder()
            .message_id_being_responded_to(message_id_being_responded_to)
            .affected_sop_class_uid(affected_sop_class_uid)
            .affected_sop_instance_uid(affected_sop_instance_uid)
            .action_type_id(action_type_id)
            .status(status)
            .build();
        send_message(conn, context_id, &rsp.encode(action_reply.is_some()), action_reply)
    }

    pub fn n_delete<C: DimseConnection>(
        conn: &mut C,
        context_id: u8,
        message_id_being_responded_to: u16,
        affected_sop_class_uid: &str,
        affected_sop_instance_uid: &str,
        status: u16,
    ) -> Result<()> {
        let rsp = NDeleteRsp::builder()
            .message_id_being_responded_to(message_id_being_responded_to)
            .affected_sop_class_uid(affected_sop_class_uid)
            .affected_sop_instance_uid(affected_sop_instance_uid)
            .status(status)
            .build();
        send_message(conn, context_id, &rsp.encode(false), None)
    }
}
