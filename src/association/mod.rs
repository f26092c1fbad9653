//! DICOM association module
//!
//! This module contains utilities for establishing and negotiating
//! associations between DICOM application entities over TCP/IP, in either
//! the requestor ([`client`]) or acceptor ([`server`]) role, plus the
//! [`pdata`] helper for streaming large P-Data fragments.

use std::time::Duration;

use snafu::{Backtrace, Snafu};

use crate::pdu::{AbortRQSource, AssociationRJResult, AssociationRJSource, PresentationContextNegotiated, UserVariableItem};

pub mod client;
pub mod pdata;
pub mod server;
#[cfg(test)]
mod tests;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("could not connect to remote node"))]
    Connect {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not set socket read timeout"))]
    SetReadTimeout {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not set socket write timeout"))]
    SetWriteTimeout {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("could not send PDU"))]
    Send {
        #[snafu(backtrace)]
        source: crate::pdu::writer::Error,
    },

    #[snafu(display("could not receive PDU"))]
    Receive {
        #[snafu(backtrace)]
        source: crate::pdu::reader::Error,
    },

    #[snafu(display("no abstract syntax was configured"))]
    MissingAbstractSyntax,

    #[snafu(display("protocol version {their_version:#06x} is not supported"))]
    ProtocolVersionMismatch { their_version: u16 },

    #[snafu(display("association rejected: {source:?} ({result:?})"))]
    Rejected {
        result: AssociationRJResult,
        source: AssociationRJSource,
    },

    #[snafu(display("association aborted by peer: {source:?}"))]
    Aborted { source: AbortRQSource },

    #[snafu(display("no presentation context was accepted"))]
    NoAcceptedPresentationContexts,

    #[snafu(display("received unexpected PDU of kind `{pdu_kind}`"))]
    UnexpectedPdu { pdu_kind: &'static str },

    #[snafu(display("association state machine rejected the event: {source}"))]
    IllegalState {
        source: crate::state::IllegalTransition,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Socket read/write timeout configuration, shared by
/// [`ClientAssociationOptions`](client::ClientAssociationOptions) and
/// [`ServerAssociationOptions`](server::ServerAssociationOptions).
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketOptions {
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

/// A service class user or a provider.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ServiceClassRole {
    /// Service Class User
    Scu,
    /// Service Class Provider
    Scp,
}

/// The outcome of a successful association negotiation, before it is
/// wrapped in the role-specific association handle.
#[derive(Debug, Clone)]
pub(crate) struct NegotiatedOptions {
    pub presentation_contexts: Vec<PresentationContextNegotiated>,
    pub user_variables: Vec<UserVariableItem>,
    pub peer_max_pdu_length: u32,
    pub peer_ae_title: String,
}

/// Common read-only accessors shared by both association roles.
pub trait Association {
    /// Obtain a view of the negotiated presentation contexts.
    fn presentation_contexts(&self) -> &[PresentationContextNegotiated];

    /// Retrieve the maximum PDU length admitted by this application entity.
    fn acceptor_max_pdu_length(&self) -> u32;

    /// Retrieve the maximum PDU length that the requestor is expecting to
    /// receive.
    fn requestor_max_pdu_length(&self) -> u32;

    /// Obtain the remote DICOM node's application entity title.
    fn peer_ae_title(&self) -> &str;

    /// The user variables received from the peer during negotiation.
    fn user_variables(&self) -> &[UserVariableItem];

    /// Find the negotiated presentation context with the given
    /// abstract syntax, if accepted.
    fn presentation_context_for(&self, abstract_syntax_uid: &str) -> Option<&PresentationContextNegotiated> {
        self.presentation_contexts()
            .iter()
            .find(|pc| pc.is_accepted() && pc.abstract_syntax == abstract_syntax_uid)
    }
}
