//! DIMSE command set codec (PS3.7 Annex E, PS3.8 §4.1/§3.7 of the spec).
//!
//! The command set is always encoded Implicit VR Little Endian, independent
//! of the transfer syntax negotiated for the accompanying dataset. This
//! module implements that small, fixed encoding directly: the crate never
//! pulls in a general dataset codec for it, since the command dictionary is
//! a short, closed list of group-0x0000 elements (§3.7).
//!
//! The dataset half of a DIMSE message is treated as an opaque, already
//! encoded byte string supplied by the caller; this module never inspects
//! its contents (see SPEC_FULL.md §3.10).

use dicom_core::{Tag, VR};
use dicom_dictionary_std::tags;
use snafu::{ensure, Backtrace, ResultExt, Snafu};

use crate::{
    pdu::{PDataValue, PDataValueType},
    Pdu,
};

#[repr(u16)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Priority {
    Low = 0x0002,
    Medium = 0x0000,
    High = 0x0001,
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CommandDatasetType {
    Present = 0x0001,
    Absent = 0x0101,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum CommandField {
    C_STORE_RQ = 0x0001,
    C_STORE_RSP = 0x8001,
    C_GET_RQ = 0x0010,
    C_GET_RSP = 0x8010,
    C_FIND_RQ = 0x0020,
    C_FIND_RSP = 0x8020,
    C_MOVE_RQ = 0x0021,
    C_MOVE_RSP = 0x8021,
    C_ECHO_RQ = 0x0030,
    C_ECHO_RSP = 0x8030,
    N_EVENT_REPORT_RQ = 0x0100,
    N_EVENT_REPORT_RSP = 0x8100,
    N_GET_RQ = 0x0110,
    N_GET_RSP = 0x8110,
    N_SET_RQ = 0x0120,
    N_SET_RSP = 0x8120,
    N_ACTION_RQ = 0x0130,
    N_ACTION_RSP = 0x8130,
    N_CREATE_RQ = 0x0140,
    N_CREATE_RSP = 0x8140,
    N_DELETE_RQ = 0x0150,
    N_DELETE_RSP = 0x8150,
    C_CANCEL_RQ = 0x0FFF,
}

impl CommandField {
    /// Recover a command field from its wire value, as found in a decoded
    /// command set's Command Field (0000,0100) element.
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x0001 => CommandField::C_STORE_RQ,
            0x8001 => CommandField::C_STORE_RSP,
            0x0010 => CommandField::C_GET_RQ,
            0x8010 => CommandField::C_GET_RSP,
            0x0020 => CommandField::C_FIND_RQ,
            0x8020 => CommandField::C_FIND_RSP,
            0x0021 => CommandField::C_MOVE_RQ,
            0x8021 => CommandField::C_MOVE_RSP,
            0x0030 => CommandField::C_ECHO_RQ,
            0x8030 => CommandField::C_ECHO_RSP,
            0x0100 => CommandField::N_EVENT_REPORT_RQ,
            0x8100 => CommandField::N_EVENT_REPORT_RSP,
            0x0110 => CommandField::N_GET_RQ,
            0x8110 => CommandField::N_GET_RSP,
            0x0120 => CommandField::N_SET_RQ,
            0x8120 => CommandField::N_SET_RSP,
            0x0130 => CommandField::N_ACTION_RQ,
            0x8130 => CommandField::N_ACTION_RSP,
            0x0140 => CommandField::N_CREATE_RQ,
            0x8140 => CommandField::N_CREATE_RSP,
            0x0150 => CommandField::N_DELETE_RQ,
            0x8150 => CommandField::N_DELETE_RSP,
            0x0FFF => CommandField::C_CANCEL_RQ,
            _ => return None,
        })
    }
}

/// A value held by one element of a command set.
///
/// Only the VRs actually used by the command dictionary need be
/// representable: `US` (status/counters/IDs), `UI` (SOP Class/Instance
/// UIDs), and `AE` (move destination / originator titles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValue {
    /// The field is absent; no element is emitted for it.
    None,
    U16(u16),
    Str(String),
    /// An `AT` attribute tag list, used by N-GET's Attribute Identifier List.
    TagList(Vec<Tag>),
    /// Raw bytes of an element whose tag is not part of the command
    /// dictionary this crate knows about. Preserved rather than rejected, so
    /// that a peer sending a private or future command element does not
    /// make the whole command set undecodable.
    Bytes(Vec<u8>),
}

impl From<Vec<Tag>> for CommandValue {
    fn from(value: Vec<Tag>) -> Self {
        if value.is_empty() {
            CommandValue::None
        } else {
            CommandValue::TagList(value)
        }
    }
}

impl From<u16> for CommandValue {
    fn from(value: u16) -> Self {
        CommandValue::U16(value)
    }
}

impl From<Option<u16>> for CommandValue {
    fn from(value: Option<u16>) -> Self {
        match value {
            Some(v) => CommandValue::U16(v),
            None => CommandValue::None,
        }
    }
}

impl From<&str> for CommandValue {
    fn from(value: &str) -> Self {
        CommandValue::Str(value.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(value: String) -> Self {
        CommandValue::Str(value)
    }
}

impl<'a> From<Option<&'a str>> for CommandValue {
    fn from(value: Option<&'a str>) -> Self {
        match value {
            Some(v) => CommandValue::Str(v.to_string()),
            None => CommandValue::None,
        }
    }
}

/// One element of a DIMSE command set: a tag, its VR, and its value.
#[derive(Debug, Clone)]
pub struct CommandElement {
    pub tag: Tag,
    pub vr: VR,
    pub value: CommandValue,
}

impl CommandElement {
    pub fn new<V: Into<CommandValue>>(tag: Tag, vr: VR, value: V) -> Self {
        CommandElement {
            tag,
            vr,
            value: value.into(),
        }
    }
}

/// Encode a command set as Implicit VR Little Endian bytes (PS3.5 §6.2.2 /
/// the command-set restriction in PS3.7 Annex E).
///
/// Elements whose value is [`CommandValue::None`] are omitted entirely.
/// String VRs are padded to an even length: `UI` with a trailing `0x00`,
/// every other string VR with a trailing space, matching the dataset
/// padding convention described in spec.md §3.2. Elements are sorted into
/// ascending `(group, element)` order before being written, per PS3.5 §7.1;
/// callers build `elements()` in whatever order reads naturally for the
/// struct's fields.
pub fn encode_elements(elements: &[CommandElement]) -> Vec<u8> {
    let mut elements: Vec<&CommandElement> = elements.iter().collect();
    elements.sort_by_key(|e| (e.tag.group(), e.tag.element()));

    let mut out = Vec::new();
    for element in elements {
        let mut value_bytes = match &element.value {
            CommandValue::None => continue,
            CommandValue::U16(v) => v.to_le_bytes().to_vec(),
            CommandValue::Str(s) => s.as_bytes().to_vec(),
            CommandValue::TagList(tags) => {
                let mut bytes = Vec::with_capacity(tags.len() * 4);
                for tag in tags {
                    bytes.extend_from_slice(&tag.group().to_le_bytes());
                    bytes.extend_from_slice(&tag.element().to_le_bytes());
                }
                bytes
            }
            CommandValue::Bytes(bytes) => bytes.clone(),
        };
        if matches!(element.value, CommandValue::Str(_)) && value_bytes.len() % 2 == 1 {
            let pad = if element.vr == VR::UI { 0x00 } else { 0x20 };
            value_bytes.push(pad);
        }
        out.extend_from_slice(&element.tag.group().to_le_bytes());
        out.extend_from_slice(&element.tag.element().to_le_bytes());
        out.extend_from_slice(&(value_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(&value_bytes);
    }
    out
}

/// Errors produced while decoding a received command set.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeError {
    #[snafu(display("command set element header truncated at offset {offset}"))]
    TruncatedHeader { offset: usize, backtrace: Backtrace },

    #[snafu(display("command set element at offset {offset} declares a length past the end of the buffer"))]
    TruncatedValue { offset: usize, backtrace: Backtrace },

    #[snafu(display("command set element {tag} has a value of {len} bytes, US requires exactly 2"))]
    InvalidUsLength { tag: Tag, len: usize, backtrace: Backtrace },

    #[snafu(display("command set element {tag} is not valid ASCII/UTF-8 text"))]
    InvalidText {
        tag: Tag,
        source: std::str::Utf8Error,
        backtrace: Backtrace,
    },

    #[snafu(display("command set element {tag} has a tag list of {len} bytes, AT requires a multiple of 4"))]
    InvalidTagListLength { tag: Tag, len: usize, backtrace: Backtrace },
}

/// The VR used on the wire by each command dictionary tag this crate knows
/// about. Implicit VR Little Endian carries no VR inline, so the decoder
/// must already know it, mirroring the VR each [`CommandElement`] is built
/// with on the encode side.
pub fn vr_for_tag(tag: Tag) -> VR {
    match tag {
        t if t == tags::AFFECTED_SOP_CLASS_UID => VR::UI,
        t if t == tags::REQUESTED_SOP_CLASS_UID => VR::UI,
        t if t == tags::AFFECTED_SOP_INSTANCE_UID => VR::UI,
        t if t == tags::REQUESTED_SOP_INSTANCE_UID => VR::UI,
        t if t == tags::MOVE_DESTINATION => VR::AE,
        t if t == tags::MOVE_ORIGINATOR_APPLICATION_ENTITY_TITLE => VR::AE,
        t if t == tags::ATTRIBUTE_IDENTIFIER_LIST => VR::AT,
        _ => VR::US,
    }
}

fn trim_text_padding(s: &str) -> &str {
    s.trim_end_matches(['\0', ' '])
}

fn decode_value(tag: Tag, vr: VR, bytes: &[u8]) -> Result<CommandValue, DecodeError> {
    match vr {
        VR::US => {
            ensure!(bytes.len() == 2, InvalidUsLengthSnafu { tag, len: bytes.len() });
            Ok(CommandValue::U16(u16::from_le_bytes([bytes[0], bytes[1]])))
        }
        VR::UI | VR::AE => {
            let text = std::str::from_utf8(bytes).context(InvalidTextSnafu { tag })?;
            Ok(CommandValue::Str(trim_text_padding(text).to_string()))
        }
        VR::AT => {
            ensure!(
                bytes.len() % 4 == 0,
                InvalidTagListLengthSnafu { tag, len: bytes.len() }
            );
            let tags = bytes
                .chunks_exact(4)
                .map(|c| Tag(u16::from_le_bytes([c[0], c[1]]), u16::from_le_bytes([c[2], c[3]])))
                .collect();
            Ok(CommandValue::TagList(tags))
        }
        _ => Ok(CommandValue::Bytes(bytes.to_vec())),
    }
}

/// Decode a command set encoded as Implicit VR Little Endian bytes, the
/// inverse of [`encode_elements`].
///
/// Each element's VR is recovered via [`vr_for_tag`] rather than read from
/// the wire, since Implicit VR carries none.
pub fn decode_elements(bytes: &[u8]) -> Result<Vec<CommandElement>, DecodeError> {
    let mut elements = Vec::new();
    let mut offset = 0usize;
    let mut cursor = bytes;
    while !cursor.is_empty() {
        ensure!(cursor.len() >= 8, TruncatedHeaderSnafu { offset });
        let group = u16::from_le_bytes([cursor[0], cursor[1]]);
        let element = u16::from_le_bytes([cursor[2], cursor[3]]);
        let len = u32::from_le_bytes([cursor[4], cursor[5], cursor[6], cursor[7]]) as usize;
        cursor = &cursor[8..];
        offset += 8;
        ensure!(cursor.len() >= len, TruncatedValueSnafu { offset });
        let (value_bytes, rest) = cursor.split_at(len);
        cursor = rest;
        offset += len;

        let tag = Tag(group, element);
        let vr = vr_for_tag(tag);
        let value = decode_value(tag, vr, value_bytes)?;
        elements.push(CommandElement::new(tag, vr, value));
    }
    Ok(elements)
}

/// Trait that marks a message struct to only allow PDUs with an associated dataset
///
/// Only exposes the `pdu_with_dataset` command requiring the user to pass an associated
/// dataset, already encoded in the negotiated transfer syntax.
pub trait DatasetRequiredCommand: Command {
    /// Create a PDU for the command using the selected presentation context and
    /// an already-encoded dataset.
    fn pdu_with_dataset(&self, pc_selected: u8, dataset: Vec<u8>) -> Pdu {
        let data = vec![
            PDataValue {
                presentation_context_id: pc_selected,
                value_type: PDataValueType::Command,
                is_last: true,
                data: self.encode(true),
            },
            PDataValue {
                presentation_context_id: pc_selected,
                value_type: PDataValueType::Data,
                is_last: true,
                data: dataset,
            },
        ];
        Pdu::PData { data }
    }
}

/// Trait that marks a message struct as conditionally allowing a dataset
///
/// This could either be truly conditional, e.g. For the C-FIND response primitive
/// the standard says:
///
/// > In the response/confirmation, this is the same list of Attributes with
/// > values of these Attributes in a particular composite SOP Instance that
/// > matched. It shall be sent only when that Status (0000,0900) is equal to
/// > Pending (not permitted for other statuses).
///
/// A service user option, e.g. for both C-MOVE and C-GET, the response primitive
/// is not required by the DIMSE service to contain a dataset, but it _is_ required
/// by the DIMSE C-GET and C-MOVE service user
///
///
/// > **NOTE** Structs implementing this trait will have access to both the
/// > `pdu` and `pdu_with_dataset`. Users of these structs should take care
/// > to use the appropriate method based on the standard.
pub trait DatasetConditionalCommand: DatasetRequiredCommand {
    /// Create a PDU for the command using the selected presentation context
    fn pdu(&self, pc_selected: u8) -> Pdu {
        Pdu::PData {
            data: vec![PDataValue {
                presentation_context_id: pc_selected,
                value_type: PDataValueType::Command,
                is_last: true,
                data: self.encode(false),
            }],
        }
    }
}

/// Trait that marks a message as not allowing a dataset.
pub trait DatasetForbiddenCommand: Command {
    /// Create a PDU for the command using the selected presentation context
    fn pdu(&self, pc_selected: u8) -> Pdu {
        Pdu::PData {
            data: vec![PDataValue {
                presentation_context_id: pc_selected,
                value_type: PDataValueType::Command,
                is_last: true,
                data: self.encode(false),
            }],
        }
    }
}

pub trait Command {
    /// Get the command field code for this Command
    fn command_field(&self) -> u16;
    /// Get the command set elements that make up this command, excluding
    /// Command Data Set Type (added by [`Command::encode`]).
    fn elements(&self) -> Vec<CommandElement>;
    /// Encode the command into bytes
    fn encode(&self, ds_included: bool) -> Vec<u8> {
        let mut elements = self.elements();
        elements.insert(
            0,
            CommandElement::new(tags::COMMAND_FIELD, VR::US, self.command_field()),
        );
        elements.push(CommandElement::new(
            tags::COMMAND_DATA_SET_TYPE,
            VR::US,
            if ds_included {
                CommandDatasetType::Present as u16
            } else {
                CommandDatasetType::Absent as u16
            },
        ));
        encode_elements(&elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::generated::{CEchoRq, CEchoRsp};

    fn element_bytes(group: u16, element: u16, value: &[u8]) -> Vec<u8> {
        let mut out = group.to_le_bytes().to_vec();
        out.extend_from_slice(&element.to_le_bytes());
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(value);
        out
    }

    // Command Field is inserted by `encode`, not by the struct's own
    // `elements()`; Message ID Being Responded To and Status are absent
    // on the request, so only four elements are expected, in ascending
    // tag order: (0000,0002), (0000,0100), (0000,0110), (0000,0800).
    #[test]
    fn c_echo_rq_is_byte_exact_in_ascending_tag_order() {
        let rq = CEchoRq::builder()
            .message_id(1)
            .affected_sop_class_uid(crate::uids::VERIFICATION)
            .build();

        let mut expected = Vec::new();
        expected.extend(element_bytes(0x0000, 0x0002, b"1.2.840.10008.1.1\0"));
        expected.extend(element_bytes(
            0x0000,
            0x0100,
            &(CommandField::C_ECHO_RQ as u16).to_le_bytes(),
        ));
        expected.extend(element_bytes(0x0000, 0x0110, &1u16.to_le_bytes()));
        expected.extend(element_bytes(
            0x0000,
            0x0800,
            &(CommandDatasetType::Absent as u16).to_le_bytes(),
        ));

        assert_eq!(rq.encode(false), expected);
    }

    // Regression test: (0000,0800) must appear exactly once. Every RQ
    // struct's `elements()` used to hardcode it alongside the copy
    // `Command::encode` always appends, producing a duplicate element.
    #[test]
    fn c_echo_rsp_is_byte_exact_with_single_dataset_type_element() {
        let rsp = CEchoRsp::builder()
            .message_id_being_responded_to(1)
            .affected_sop_class_uid(crate::uids::VERIFICATION)
            .status(0x0000)
            .build();

        let mut expected = Vec::new();
        expected.extend(element_bytes(0x0000, 0x0002, b"1.2.840.10008.1.1\0"));
        expected.extend(element_bytes(
            0x0000,
            0x0100,
            &(CommandField::C_ECHO_RSP as u16).to_le_bytes(),
        ));
        expected.extend(element_bytes(0x0000, 0x0120, &1u16.to_le_bytes()));
        expected.extend(element_bytes(
            0x0000,
            0x0800,
            &(CommandDatasetType::Absent as u16).to_le_bytes(),
        ));
        expected.extend(element_bytes(0x0000, 0x0900, &0u16.to_le_bytes()));

        let encoded = rsp.encode(false);
        assert_eq!(encoded, expected);
        assert_eq!(
            encoded
                .windows(4)
                .filter(|w| w == b"\x00\x00\x00\x08")
                .count(),
            1,
            "Command Data Set Type must appear exactly once"
        );
    }
}
