//! Crate-level error type aggregating the lower-level codec and association
//! errors into the taxonomy a DIMSE service caller reasons about.
//!
//! Lower layers (the PDU codec in [`crate::pdu`], negotiation in
//! [`crate::association`]) define their own narrower `snafu`-derived error
//! enums; this module is where those get folded into the handful of kinds
//! that actually matter to a caller deciding what to do next.

use snafu::{Backtrace, Snafu};

use crate::pdu::{AbortRQSource, AssociationRJResult, AssociationRJSource};

/// Type alias for a result from this crate's DIMSE service layer.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// Connect failed, read/write failed, unexpected EOF, or an I/O timeout.
    #[snafu(display("transport error"))]
    Transport {
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The PDU decoder could not parse the bytes on the wire.
    #[snafu(display("malformed PDU"))]
    MalformedPdu {
        #[snafu(backtrace)]
        source: crate::pdu::reader::Error,
    },

    /// An event was illegal in the association's current state, or a PDV
    /// sequence was invalid (e.g. a data fragment preceding its command).
    #[snafu(display("protocol violation: {detail}"))]
    ProtocolViolation { detail: String },

    /// The remote peer sent an A-ASSOCIATE-RJ.
    #[snafu(display("association rejected: result {result:?}, source {source:?}"))]
    AssociationRejected {
        result: AssociationRJResult,
        source: AssociationRJSource,
    },

    /// The remote peer sent an A-ABORT, or a local abort was issued.
    #[snafu(display("association aborted: {source:?}"))]
    Aborted { source: AbortRQSource },

    /// No presentation contexts were accepted, or a context required by the
    /// caller was rejected.
    #[snafu(display("presentation context negotiation failed"))]
    NegotiationFailed { backtrace: Backtrace },

    /// A response timer expired while awaiting a DIMSE response.
    #[snafu(display("operation timed out"))]
    OperationTimeout { backtrace: Backtrace },

    /// A DIMSE operation completed with a failure-class status.
    #[snafu(display("DIMSE operation failed with status {status:#06x}"))]
    DimseFailure { status: u16 },

    /// An argument supplied by the caller was invalid (AE title too long,
    /// malformed UID, PDU size below the negotiable minimum, etc).
    #[snafu(display("invalid argument: {detail}"))]
    InvalidArgument { detail: String },
}
