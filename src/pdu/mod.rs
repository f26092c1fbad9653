//! Protocol data units of the DICOM upper layer protocol (PS3.8 §9.3).

pub mod commands;
pub mod commands_n;
pub mod generated;
pub mod reader;
pub mod text;
pub mod writer;

#[cfg(test)]
mod test;

pub use commands::{Command, CommandDatasetType, CommandField, Priority};
pub use reader::read_pdu;
pub use writer::write_pdu;

/// Default maximum PDU length proposed by this crate when none is given.
pub const DEFAULT_MAX_PDU: u32 = 16_384;

/// Smallest maximum PDU length a conforming association may negotiate to.
pub const MINIMUM_PDU_SIZE: u32 = 4_096;

/// Largest maximum PDU length this crate will ever negotiate to, regardless
/// of what a peer proposes.
pub const MAXIMUM_PDU_SIZE: u32 = 131_072;

/// A sensibly large single-PDU length used as an upper clamp on buffers this
/// crate allocates eagerly, independent of what a peer declares.
pub const LARGE_PDU_SIZE: u32 = 16_384;

/// Size in bytes of the fixed PDU header (type + reserved + length).
pub const PDU_HEADER_SIZE: u32 = 6;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AssociationRQ {
    pub protocol_version: u16,
    pub calling_ae_title: String,
    pub called_ae_title: String,
    pub application_context_name: String,
    pub presentation_contexts: Vec<PresentationContextProposed>,
    pub user_variables: Vec<UserVariableItem>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AssociationAC {
    pub protocol_version: u16,
    pub application_context_name: String,
    pub presentation_contexts: Vec<PresentationContextResult>,
    pub calling_ae_title: String,
    pub called_ae_title: String,
    pub user_variables: Vec<UserVariableItem>,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AssociationRJ {
    pub result: AssociationRJResult,
    pub source: AssociationRJSource,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub struct PresentationContextProposed {
    pub id: u8,
    pub abstract_syntax: String,
    pub transfer_syntaxes: Vec<String>,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub struct PresentationContextResult {
    pub id: u8,
    pub reason: PresentationContextResultReason,
    pub transfer_syntax: String,
}

/// A presentation context as seen after negotiation settles, pairing the
/// accepted transfer syntax back with the abstract syntax it was proposed
/// for (the AC PDU alone does not carry the abstract syntax).
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PresentationContextNegotiated {
    pub id: u8,
    pub reason: PresentationContextResultReason,
    pub abstract_syntax: String,
    pub transfer_syntax: String,
}

impl PresentationContextNegotiated {
    pub fn is_accepted(&self) -> bool {
        self.reason == PresentationContextResultReason::Acceptance
    }
}

#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum PresentationContextResultReason {
    Acceptance = 0,
    UserRejection = 1,
    NoReason = 2,
    AbstractSyntaxNotSupported = 3,
    TransferSyntaxesNotSupported = 4,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AssociationRJResult {
    Permanent,
    Transient,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AssociationRJSource {
    ServiceUser(AssociationRJServiceUserReason),
    ServiceProviderASCE(AssociationRJServiceProviderASCEReason),
    ServiceProviderPresentation(AssociationRJServiceProviderPresentationReason),
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AssociationRJServiceUserReason {
    NoReasonGiven,
    ApplicationContextNameNotSupported,
    CallingAETitleNotRecognized,
    CalledAETitleNotRecognized,
    Reserved(u8),
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AssociationRJServiceProviderASCEReason {
    NoReasonGiven,
    ProtocolVersionNotSupported,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AssociationRJServiceProviderPresentationReason {
    TemporaryCongestion,
    LocalLimitExceeded,
    Reserved(u8),
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub struct PDataValue {
    pub presentation_context_id: u8,
    pub value_type: PDataValueType,
    pub is_last: bool,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum PDataValueType {
    Command,
    Data,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AbortRQSource {
    ServiceUser,
    ServiceProvider(AbortRQServiceProviderReason),
    Reserved,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum AbortRQServiceProviderReason {
    ReasonNotSpecifiedUnrecognizedPDU,
    UnexpectedPDU,
    Reserved,
    UnrecognizedPDUParameter,
    UnexpectedPDUParameter,
    InvalidPDUParameter,
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum PduVariableItem {
    Unknown(u8),
    ApplicationContext(String),
    PresentationContextProposed(PresentationContextProposed),
    PresentationContextResult(PresentationContextResult),
    UserVariables(Vec<UserVariableItem>),
}

#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum UserVariableItem {
    Unknown(u8, Vec<u8>),
    MaxLength(u32),
    ImplementationClassUID(String),
    ImplementationVersionName(String),
    /// User Identity RQ sub-item (PS3.7 Annex D.3.3.7), item type 0x58.
    UserIdentity(UserIdentity),
    /// User Identity Server Response sub-item, item type 0x59. Only
    /// meaningful on an A-ASSOCIATE-AC, and only when the requestor set
    /// `positive_response_requested` on its own User Identity item.
    UserIdentityServerResponse(Vec<u8>),
}

/// The five shapes of user identity negotiation carried by a User Identity
/// RQ sub-item (item type 0x58).
#[derive(Clone, Eq, PartialEq, PartialOrd, Hash, Debug)]
pub enum UserIdentity {
    Username {
        username: String,
        positive_response_requested: bool,
    },
    UsernamePasscode {
        username: String,
        passcode: String,
        positive_response_requested: bool,
    },
    KerberosServiceTicket {
        ticket: Vec<u8>,
        positive_response_requested: bool,
    },
    SamlAssertion {
        assertion: Vec<u8>,
        positive_response_requested: bool,
    },
    Jwt {
        token: Vec<u8>,
        positive_response_requested: bool,
    },
}

impl UserIdentity {
    pub(crate) fn type_code(&self) -> u8 {
        match self {
            UserIdentity::Username { .. } => 1,
            UserIdentity::UsernamePasscode { .. } => 2,
            UserIdentity::KerberosServiceTicket { .. } => 3,
            UserIdentity::SamlAssertion { .. } => 4,
            UserIdentity::Jwt { .. } => 5,
        }
    }

    pub fn positive_response_requested(&self) -> bool {
        match self {
            UserIdentity::Username {
                positive_response_requested,
                ..
            }
            | UserIdentity::UsernamePasscode {
                positive_response_requested,
                ..
            }
            | UserIdentity::KerberosServiceTicket {
                positive_response_requested,
                ..
            }
            | UserIdentity::SamlAssertion {
                positive_response_requested,
                ..
            }
            | UserIdentity::Jwt {
                positive_response_requested,
                ..
            } => *positive_response_requested,
        }
    }

    /// The primary field bytes, as laid out on the wire.
    pub(crate) fn primary_field(&self) -> Vec<u8> {
        match self {
            UserIdentity::Username { username, .. } => username.as_bytes().to_vec(),
            UserIdentity::UsernamePasscode { username, .. } => username.as_bytes().to_vec(),
            UserIdentity::KerberosServiceTicket { ticket, .. } => ticket.clone(),
            UserIdentity::SamlAssertion { assertion, .. } => assertion.clone(),
            UserIdentity::Jwt { token, .. } => token.clone(),
        }
    }

    /// The secondary field bytes (only non-empty for username+passcode).
    pub(crate) fn secondary_field(&self) -> Vec<u8> {
        match self {
            UserIdentity::UsernamePasscode { passcode, .. } => passcode.as_bytes().to_vec(),
            _ => Vec::new(),
        }
    }
}

/// A decoded protocol data unit, the on-the-wire unit this crate reads and
/// writes over a TCP connection carrying the upper layer protocol.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Pdu {
    AssociationRQ(AssociationRQ),
    AssociationAC(AssociationAC),
    AssociationRJ(AssociationRJ),
    PData { data: Vec<PDataValue> },
    ReleaseRQ,
    ReleaseRP,
    AbortRQ { source: AbortRQSource },
    Unknown { pdu_type: u8, data: Vec<u8> },
}

impl PresentationContextResultReason {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => PresentationContextResultReason::Acceptance,
            1 => PresentationContextResultReason::UserRejection,
            2 => PresentationContextResultReason::NoReason,
            3 => PresentationContextResultReason::AbstractSyntaxNotSupported,
            4 => PresentationContextResultReason::TransferSyntaxesNotSupported,
            _ => return None,
        })
    }

    pub(crate) fn to_u8(self) -> u8 {
        self as u8
    }
}

impl AssociationRJResult {
    pub(crate) fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => AssociationRJResult::Permanent,
            2 => AssociationRJResult::Transient,
            _ => return None,
        })
    }

    pub(crate) fn to_u8(&self) -> u8 {
        match self {
            AssociationRJResult::Permanent => 1,
            AssociationRJResult::Transient => 2,
        }
    }
}

impl AssociationRJSource {
    pub(crate) fn from_u8(source: u8, reason: u8) -> Option<Self> {
        Some(match source {
            1 => AssociationRJSource::ServiceUser(match reason {
                1 => AssociationRJServiceUserReason::NoReasonGiven,
                2 => AssociationRJServiceUserReason::ApplicationContextNameNotSupported,
                3 => AssociationRJServiceUserReason::CallingAETitleNotRecognized,
                7 => AssociationRJServiceUserReason::CalledAETitleNotRecognized,
                other => AssociationRJServiceUserReason::Reserved(other),
            }),
            2 => AssociationRJSource::ServiceProviderASCE(match reason {
                1 => AssociationRJServiceProviderASCEReason::NoReasonGiven,
                2 => AssociationRJServiceProviderASCEReason::ProtocolVersionNotSupported,
                _ => return None,
            }),
            3 => AssociationRJSource::ServiceProviderPresentation(match reason {
                1 => AssociationRJServiceProviderPresentationReason::TemporaryCongestion,
                2 => AssociationRJServiceProviderPresentationReason::LocalLimitExceeded,
                other => AssociationRJServiceProviderPresentationReason::Reserved(other),
            }),
            _ => return None,
        })
    }

    pub(crate) fn to_u8_pair(&self) -> (u8, u8) {
        match self {
            AssociationRJSource::ServiceUser(reason) => (
                1,
                match reason {
                    AssociationRJServiceUserReason::NoReasonGiven => 1,
                    AssociationRJServiceUserReason::ApplicationContextNameNotSupported => 2,
                    AssociationRJServiceUserReason::CallingAETitleNotRecognized => 3,
                    AssociationRJServiceUserReason::CalledAETitleNotRecognized => 7,
                    AssociationRJServiceUserReason::Reserved(v) => *v,
                },
            ),
            AssociationRJSource::ServiceProviderASCE(reason) => (
                2,
                match reason {
                    AssociationRJServiceProviderASCEReason::NoReasonGiven => 1,
                    AssociationRJServiceProviderASCEReason::ProtocolVersionNotSupported => 2,
                },
            ),
            AssociationRJSource::ServiceProviderPresentation(reason) => (
                3,
                match reason {
                    AssociationRJServiceProviderPresentationReason::TemporaryCongestion => 1,
                    AssociationRJServiceProviderPresentationReason::LocalLimitExceeded => 2,
                    AssociationRJServiceProviderPresentationReason::Reserved(v) => *v,
                },
            ),
        }
    }
}

impl AbortRQSource {
    pub(crate) fn from_u8(source: u8, reason: u8) -> Option<Self> {
        Some(match source {
            0 => AbortRQSource::ServiceUser,
            2 => AbortRQSource::ServiceProvider(match reason {
                0 => AbortRQServiceProviderReason::ReasonNotSpecifiedUnrecognizedPDU,
                2 => AbortRQServiceProviderReason::UnexpectedPDU,
                3 => AbortRQServiceProviderReason::Reserved,
                4 => AbortRQServiceProviderReason::UnrecognizedPDUParameter,
                5 => AbortRQServiceProviderReason::UnexpectedPDUParameter,
                6 => AbortRQServiceProviderReason::InvalidPDUParameter,
                _ => return None,
            }),
            1 => AbortRQSource::Reserved,
            _ => return None,
        })
    }

    pub(crate) fn to_u8_pair(&self) -> (u8, u8) {
        match self {
            AbortRQSource::ServiceUser => (0, 0),
            AbortRQSource::Reserved => (1, 0),
            AbortRQSource::ServiceProvider(reason) => (
                2,
                match reason {
                    AbortRQServiceProviderReason::ReasonNotSpecifiedUnrecognizedPDU => 0,
                    AbortRQServiceProviderReason::UnexpectedPDU => 2,
                    AbortRQServiceProviderReason::Reserved => 3,
                    AbortRQServiceProviderReason::UnrecognizedPDUParameter => 4,
                    AbortRQServiceProviderReason::UnexpectedPDUParameter => 5,
                    AbortRQServiceProviderReason::InvalidPDUParameter => 6,
                },
            ),
        }
    }
}

impl Pdu {
    /// A short machine-readable name for the PDU type, used in log lines and
    /// state machine tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            Pdu::AssociationRQ(_) => "A-ASSOCIATE-RQ",
            Pdu::AssociationAC(_) => "A-ASSOCIATE-AC",
            Pdu::AssociationRJ(_) => "A-ASSOCIATE-RJ",
            Pdu::PData { .. } => "P-DATA-TF",
            Pdu::ReleaseRQ => "A-RELEASE-RQ",
            Pdu::ReleaseRP => "A-RELEASE-RP",
            Pdu::AbortRQ { .. } => "A-ABORT",
            Pdu::Unknown { .. } => "unknown",
        }
    }
}
