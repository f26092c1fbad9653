//! DIMSE-N command structs (N-CREATE/N-SET/N-GET/N-ACTION/N-DELETE/N-EVENT-REPORT).
//!
//! Generalizes the shape of [`crate::pdu::generated`] by hand for the
//! normalized services used by stateful SOP instances: print film
//! sessions/boxes/image boxes and jobs, and MPPS instances (spec.md §4.5,
//! §4.7, §9).

use dicom_core::{Tag, VR};
use bon::Builder;
use dicom_dictionary_std::tags;

use crate::pdu::commands::{
    Command, CommandElement, CommandField, DatasetConditionalCommand, DatasetForbiddenCommand,
    DatasetRequiredCommand,
};

#[derive(Builder)]
pub struct NCreateRq<'a> {
    pub message_id: u16,
    /// SOP Class UID of the instance to create; assigned by the requester.
    pub affected_sop_class_uid: &'a str,
    /// SOP Instance UID to create. Left `None` to let the acceptor assign one
    /// (see spec.md §4.5, N-CREATE notes).
    pub affected_sop_instance_uid: Option<&'a str>,
}
impl<'a> Command for NCreateRq<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_CREATE_RQ as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID, VR::US, self.message_id),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
        ]
    }
}

#[derive(Builder)]
pub struct NCreateRsp<'a> {
    pub message_id_being_responded_to: u16,
    pub affected_sop_class_uid: Option<&'a str>,
    /// SOP Instance UID of the created instance; always present on success
    /// (spec.md §4.5 N-CREATE notes: "Acceptor assigns SOP Instance UID if
    /// requester leaves it empty").
    pub affected_sop_instance_uid: Option<&'a str>,
    pub status: u16,
}
impl<'a> Command for NCreateRsp<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_CREATE_RSP as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID_BEING_RESPONDED_TO, VR::US, self.message_id_being_responded_to),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::STATUS, VR::US, self.status),
        ]
    }
}

#[derive(Builder)]
pub struct NSetRq<'a> {
    pub message_id: u16,
    pub requested_sop_class_uid: &'a str,
    pub requested_sop_instance_uid: &'a str,
}
impl<'a> Command for NSetRq<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_SET_RQ as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID, VR::US, self.message_id),
            CommandElement::new(tags::REQUESTED_SOP_CLASS_UID, VR::UI, self.requested_sop_class_uid),
            CommandElement::new(tags::REQUESTED_SOP_INSTANCE_UID, VR::UI, self.requested_sop_instance_uid),
        ]
    }
}

#[derive(Builder)]
pub struct NSetRsp<'a> {
    pub message_id_being_responded_to: u16,
    pub affected_sop_class_uid: Option<&'a str>,
    pub affected_sop_instance_uid: Option<&'a str>,
    pub status: u16,
}
impl<'a> Command for NSetRsp<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_SET_RSP as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID_BEING_RESPONDED_TO, VR::US, self.message_id_being_responded_to),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::STATUS, VR::US, self.status),
        ]
    }
}

#[derive(Builder)]
pub struct NGetRq<'a> {
    pub message_id: u16,
    pub requested_sop_class_uid: &'a str,
    pub requested_sop_instance_uid: &'a str,
    /// Attributes to retrieve. Empty means "all attributes" (spec.md §4.5).
    #[builder(default)]
    pub attribute_identifier_list: Vec<Tag>,
}
impl<'a> Command for NGetRq<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_GET_RQ as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID, VR::US, self.message_id),
            CommandElement::new(tags::REQUESTED_SOP_CLASS_UID, VR::UI, self.requested_sop_class_uid),
            CommandElement::new(tags::REQUESTED_SOP_INSTANCE_UID, VR::UI, self.requested_sop_instance_uid),
            CommandElement::new(
                tags::ATTRIBUTE_IDENTIFIER_LIST,
                VR::AT,
                self.attribute_identifier_list.clone(),
            ),
        ]
    }
}

#[derive(Builder)]
pub struct NGetRsp<'a> {
    pub message_id_being_responded_to: u16,
    pub affected_sop_class_uid: Option<&'a str>,
    pub affected_sop_instance_uid: Option<&'a str>,
    pub status: u16,
}
impl<'a> Command for NGetRsp<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_GET_RSP as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID_BEING_RESPONDED_TO, VR::US, self.message_id_being_responded_to),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::STATUS, VR::US, self.status),
        ]
    }
}

#[derive(Builder)]
pub struct NActionRq<'a> {
    pub message_id: u16,
    pub requested_sop_class_uid: &'a str,
    pub requested_sop_instance_uid: &'a str,
    /// Identifies the action requested, e.g. `1` for "Print" on a Basic
    /// Film Box (spec.md §4.5, §9).
    pub action_type_id: u16,
}
impl<'a> Command for NActionRq<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_ACTION_RQ as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID, VR::US, self.message_id),
            CommandElement::new(tags::REQUESTED_SOP_CLASS_UID, VR::UI, self.requested_sop_class_uid),
            CommandElement::new(tags::REQUESTED_SOP_INSTANCE_UID, VR::UI, self.requested_sop_instance_uid),
            CommandElement::new(tags::ACTION_TYPE_ID, VR::US, self.action_type_id),
        ]
    }
}

#[derive(Builder)]
pub struct NActionRsp<'a> {
    pub message_id_being_responded_to: u16,
    pub affected_sop_class_uid: Option<&'a str>,
    /// E.g. the newly created Print Job SOP Instance UID (spec.md Scenario F).
    pub affected_sop_instance_uid: Option<&'a str>,
    pub action_type_id: Option<u16>,
    pub status: u16,
}
impl<'a> Command for NActionRsp<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_ACTION_RSP as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID_BEING_RESPONDED_TO, VR::US, self.message_id_being_responded_to),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::ACTION_TYPE_ID, VR::US, self.action_type_id),
            CommandElement::new(tags::STATUS, VR::US, self.status),
        ]
    }
}

#[derive(Builder)]
pub struct NDeleteRq<'a> {
    pub message_id: u16,
    pub requested_sop_class_uid: &'a str,
    pub requested_sop_instance_uid: &'a str,
}
impl<'a> Command for NDeleteRq<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_DELETE_RQ as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID, VR::US, self.message_id),
            CommandElement::new(tags::REQUESTED_SOP_CLASS_UID, VR::UI, self.requested_sop_class_uid),
            CommandElement::new(tags::REQUESTED_SOP_INSTANCE_UID, VR::UI, self.requested_sop_instance_uid),
        ]
    }
}

#[derive(Builder)]
pub struct NDeleteRsp<'a> {
    pub message_id_being_responded_to: u16,
    pub affected_sop_class_uid: Option<&'a str>,
    pub affected_sop_instance_uid: Option<&'a str>,
    pub status: u16,
}
impl<'a> Command for NDeleteRsp<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_DELETE_RSP as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID_BEING_RESPONDED_TO, VR::US, self.message_id_being_responded_to),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::STATUS, VR::US, self.status),
        ]
    }
}

#[derive(Builder)]
pub struct NEventReportRq<'a> {
    pub message_id: u16,
    pub affected_sop_class_uid: &'a str,
    pub affected_sop_instance_uid: &'a str,
    pub event_type_id: u16,
}
impl<'a> Command for NEventReportRq<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_EVENT_REPORT_RQ as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID, VR::US, self.message_id),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::EVENT_TYPE_ID, VR::US, self.event_type_id),
        ]
    }
}

#[derive(Builder)]
pub struct NEventReportRsp<'a> {
    pub message_id_being_responded_to: u16,
    pub affected_sop_class_uid: Option<&'a str>,
    pub affected_sop_instance_uid: Option<&'a str>,
    pub event_type_id: Option<u16>,
    pub status: u16,
}
impl<'a> Command for NEventReportRsp<'a> {
    fn command_field(&self) -> u16 {
        CommandField::N_EVENT_REPORT_RSP as u16
    }
    fn elements(&self) -> Vec<CommandElement> {
        vec![
            CommandElement::new(tags::MESSAGE_ID_BEING_RESPONDED_TO, VR::US, self.message_id_being_responded_to),
            CommandElement::new(tags::AFFECTED_SOP_CLASS_UID, VR::UI, self.affected_sop_class_uid),
            CommandElement::new(tags::AFFECTED_SOP_INSTANCE_UID, VR::UI, self.affected_sop_instance_uid),
            CommandElement::new(tags::EVENT_TYPE_ID, VR::US, self.event_type_id),
            CommandElement::new(tags::STATUS, VR::US, self.status),
        ]
    }
}

// Dataset cardinality (spec.md §4.5): N-CREATE/N-SET/N-GET/N-ACTION/N-EVENT-REPORT
// carry a dataset on at least one side of the exchange; N-DELETE never does.
impl<'a> DatasetRequiredCommand for NCreateRq<'a> {}
impl<'a> DatasetConditionalCommand for NCreateRq<'a> {}
impl<'a> DatasetRequiredCommand for NCreateRsp<'a> {}
impl<'a> DatasetConditionalCommand for NCreateRsp<'a> {}

impl<'a> DatasetRequiredCommand for NSetRq<'a> {}
impl<'a> DatasetRequiredCommand for NSetRsp<'a> {}
impl<'a> DatasetConditionalCommand for NSetRsp<'a> {}

impl<'a> DatasetForbiddenCommand for NGetRq<'a> {}
impl<'a> DatasetRequiredCommand for NGetRsp<'a> {}
impl<'a> DatasetConditionalCommand for NGetRsp<'a> {}

impl<'a> DatasetForbiddenCommand for NActionRq<'a> {}
impl<'a> DatasetRequiredCommand for NActionRsp<'a> {}
impl<'a> DatasetConditionalCommand for NActionRsp<'a> {}

impl<'a> DatasetForbiddenCommand for NDeleteRq<'a> {}
impl<'a> DatasetForbiddenCommand for NDeleteRsp<'a> {}

impl<'a> DatasetRequiredCommand for NEventReportRq<'a> {}
impl<'a> DatasetConditionalCommand for NEventReportRq<'a> {}
impl<'a> DatasetRequiredCommand for NEventReportRsp<'a> {}
impl<'a> DatasetConditionalCommand for NEventReportRsp<'a> {}
