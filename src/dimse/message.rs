//! The decoded DIMSE command set and the whole `(command, dataset)` message
//! pair the assembler hands to a service function (spec.md §3.7, §3.8).

use std::collections::BTreeMap;

use dicom_core::Tag;
use dicom_dictionary_std::tags;

use crate::error::{self, Result};
use crate::pdu::commands::{decode_elements, CommandField, CommandValue};

/// A decoded DIMSE command set, keyed by tag.
///
/// Values keep the shape they were encoded with (`US`, `UI`/`AE` text, `AT`
/// tag lists); accessors below narrow them to the type a given command
/// element is defined to carry.
#[derive(Debug, Clone, Default)]
pub struct CommandSet {
    elements: BTreeMap<Tag, CommandValue>,
}

impl CommandSet {
    /// Decode a command set from its Implicit VR Little Endian wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let elements = decode_elements(bytes).map_err(|source| {
            error::Error::ProtocolViolation {
                detail: format!("malformed command set: {source}"),
            }
        })?;
        Ok(CommandSet {
            elements: elements.into_iter().map(|e| (e.tag, e.value)).collect(),
        })
    }

    fn u16(&self, tag: Tag) -> Option<u16> {
        match self.elements.get(&tag)? {
            CommandValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    fn str(&self, tag: Tag) -> Option<&str> {
        match self.elements.get(&tag)? {
            CommandValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn tag_list(&self, tag: Tag) -> Option<&[Tag]> {
        match self.elements.get(&tag)? {
            CommandValue::TagList(t) => Some(t.as_slice()),
            _ => None,
        }
    }

    /// The Command Field, as a raw wire value.
    pub fn command_field_raw(&self) -> Option<u16> {
        self.u16(tags::COMMAND_FIELD)
    }

    /// The Command Field, as a typed enum; `None` if absent or unrecognised.
    pub fn command_field(&self) -> Option<CommandField> {
        CommandField::from_u16(self.command_field_raw()?)
    }

    pub fn message_id(&self) -> Option<u16> {
        self.u16(tags::MESSAGE_ID)
    }

    pub fn message_id_being_responded_to(&self) -> Option<u16> {
        self.u16(tags::MESSAGE_ID_BEING_RESPONDED_TO)
    }

    pub fn status(&self) -> Option<u16> {
        self.u16(tags::STATUS)
    }

    pub fn priority(&self) -> Option<u16> {
        self.u16(tags::PRIORITY)
    }

    pub fn affected_sop_class_uid(&self) -> Option<&str> {
        self.str(tags::AFFECTED_SOP_CLASS_UID)
    }

    pub fn affected_sop_instance_uid(&self) -> Option<&str> {
        self.str(tags::AFFECTED_SOP_INSTANCE_UID)
    }

    pub fn requested_sop_class_uid(&self) -> Option<&str> {
        self.str(tags::REQUESTED_SOP_CLASS_UID)
    }

    pub fn requested_sop_instance_uid(&self) -> Option<&str> {
        self.str(tags::REQUESTED_SOP_INSTANCE_UID)
    }

    pub fn move_destination(&self) -> Option<&str> {
        self.str(tags::MOVE_DESTINATION)
    }

    pub fn move_originator_application_entity_title(&self) -> Option<&str> {
        self.str(tags::MOVE_ORIGINATOR_APPLICATION_ENTITY_TITLE)
    }

    pub fn move_originator_message_id(&self) -> Option<u16> {
        self.u16(tags::MOVE_ORIGINATOR_MESSAGE_ID)
    }

    pub fn action_type_id(&self) -> Option<u16> {
        self.u16(tags::ACTION_TYPE_ID)
    }

    pub fn event_type_id(&self) -> Option<u16> {
        self.u16(tags::EVENT_TYPE_ID)
    }

    pub fn attribute_identifier_list(&self) -> &[Tag] {
        self.tag_list(tags::ATTRIBUTE_IDENTIFIER_LIST).unwrap_or(&[])
    }

    /// Whether Command Data Set Type indicates a dataset follows the
    /// command (any value other than `0x0101`, spec.md §3.7).
    pub fn has_dataset(&self) -> bool {
        self.u16(tags::COMMAND_DATA_SET_TYPE) != Some(0x0101)
    }

    /// The C-MOVE/C-GET sub-operation progress counters, each `None` if the
    /// response did not carry that counter.
    pub fn sub_operation_counts(&self) -> SubOperationCounts {
        SubOperationCounts {
            remaining: self.u16(tags::NUMBER_OF_REMAINING_SUBOPERATIONS),
            completed: self.u16(tags::NUMBER_OF_COMPLETED_SUBOPERATIONS),
            failed: self.u16(tags::NUMBER_OF_FAILED_SUBOPERATIONS),
            warning: self.u16(tags::NUMBER_OF_WARNING_SUBOPERATIONS),
        }
    }
}

/// C-MOVE/C-GET sub-operation progress counters (spec.md §4.5).
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SubOperationCounts {
    pub remaining: Option<u16>,
    pub completed: Option<u16>,
    pub failed: Option<u16>,
    pub warning: Option<u16>,
}

/// A whole DIMSE message: a decoded command set, plus its dataset if one
/// was present (spec.md §3.8).
#[derive(Debug, Clone)]
pub struct DimseMessage {
    pub context_id: u8,
    pub command: CommandSet,
    pub dataset: Option<Vec<u8>>,
}
