//! This crates contains the types and methods needed to interact
//! with DICOM nodes through the upper layer protocol.
//!
//! This crate can be used as a base
//! for finite-state machines and higher-level helpers,
//! enabling the creation of concrete service class users (SCUs)
//! and service class providers (SCPs).
//!
//! - The [`address`] module
//!   provides an abstraction for working with compound addresses
//!   referring to application entities in a network.
//! - The [`pdu`] module
//!   provides data structures representing _protocol data units_,
//!   which are passed around as part of the DICOM network communication support.
//! - The [`association`] module
//!   comprises abstractions for establishing and negotiating associations
//!   between application entities,
//!   via the upper layer protocol by TCP.
//! - The [`dimse`] module
//!   drives the DIMSE-C and DIMSE-N service layer on top of an established
//!   association: C-ECHO, C-STORE, the streaming C-FIND/C-MOVE/C-GET
//!   queries, and the N-CREATE/N-SET/N-GET/N-ACTION/N-DELETE operations used
//!   by stateful SOP instances.
//! - The [`print`] module
//!   models the Basic Film Session/Film Box/Image Box/Print Job hierarchy
//!   driven by the print management DIMSE-N services.
//! - The [`state`] module
//!   names the association states and events of PS3.8 §9.2, used by
//!   [`association`] to reject PDUs that arrive in a state where they are
//!   not legal.
//!
//! This crate deliberately leaves TLS negotiation to the caller: a
//! transport is anything implementing [`std::io::Read`] + [`std::io::Write`],
//! so a `rustls`- or `native-tls`-wrapped stream works exactly like a plain
//! `TcpStream` without this crate depending on either.

pub mod address;
pub mod association;
pub mod dimse;
pub mod error;
pub mod pdu;
pub mod print;
pub mod state;
pub mod uid;
pub mod uids;

/// The current implementation class UID generically referring to this crate.
///
/// Automatically generated as per the standard, part 5, section B.2.
///
/// This UID may change in future versions,
/// even between patch versions.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.156227610253341005307660858504280353500";

/// The current implementation version name generically referring to this crate.
///
/// This name may change in future versions,
/// even between patch versions.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DICOM-ULP-RS 0.1.0";

// re-exports

pub use address::{AeAddr, FullAeAddr};
pub use association::client::{ClientAssociation, ClientAssociationOptions};
pub use association::server::{ServerAssociation, ServerAssociationOptions};
pub use pdu::read_pdu;
pub use pdu::write_pdu;
pub use pdu::Pdu;
