//! Association acceptor module
//!
//! The module provides an abstraction for a DICOM application entity that
//! listens for incoming association requests and negotiates the terms of
//! the association as a service class provider (SCP). See
//! [`ServerAssociationOptions`] for details and examples on how to accept
//! an association.

use std::borrow::Cow;
use std::net::TcpStream;
use std::time::Duration;

use snafu::{ensure, ResultExt};

use crate::association::{
    Association, MissingAbstractSyntaxSnafu, NegotiatedOptions, ReceiveSnafu, SendSnafu,
    SetReadTimeoutSnafu, SetWriteTimeoutSnafu, SocketOptions,
};
use crate::pdu::{
    read_pdu, write_pdu, AbortRQServiceProviderReason, AbortRQSource, AssociationAC,
    AssociationRJ, AssociationRJResult, AssociationRJServiceUserReason, AssociationRJSource,
    AssociationRQ, Pdu, PresentationContextNegotiated, PresentationContextResult,
    PresentationContextResultReason, UserIdentity, UserVariableItem, DEFAULT_MAX_PDU,
};
use crate::uid::trim_uid;
use crate::{IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME};

use super::{Error, Result};

/// Common interface for application entity access control policies.
///
/// Existing implementations include [`AcceptAny`] and [`AcceptCalledAeTitle`],
/// but users are free to implement their own.
pub trait AccessControl {
    /// Obtain the decision of whether to accept an incoming association
    /// request based on the recorded application entity titles and/or user
    /// identity.
    ///
    /// Returns `Ok(())` if the requesting node should be given clearance.
    /// Otherwise, a concrete association RJ service user reason is given.
    fn check_access(
        &self,
        this_ae_title: &str,
        calling_ae_title: &str,
        called_ae_title: &str,
        user_identity: Option<&UserIdentity>,
    ) -> std::result::Result<(), AssociationRJServiceUserReason>;
}

/// An access control rule that accepts any incoming association request.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct AcceptAny;

impl AccessControl for AcceptAny {
    fn check_access(
        &self,
        _this_ae_title: &str,
        _calling_ae_title: &str,
        _called_ae_title: &str,
        _user_identity: Option<&UserIdentity>,
    ) -> std::result::Result<(), AssociationRJServiceUserReason> {
        Ok(())
    }
}

/// An access control rule that accepts association requests whose called AE
/// title matches this node's AE title.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct AcceptCalledAeTitle;

impl AccessControl for AcceptCalledAeTitle {
    fn check_access(
        &self,
        this_ae_title: &str,
        _calling_ae_title: &str,
        called_ae_title: &str,
        _user_identity: Option<&UserIdentity>,
    ) -> std::result::Result<(), AssociationRJServiceUserReason> {
        if this_ae_title == called_ae_title {
            Ok(())
        } else {
            Err(AssociationRJServiceUserReason::CalledAETitleNotRecognized)
        }
    }
}

/// A DICOM association builder for an acceptor DICOM node, taking the role
/// of a service class provider (SCP).
///
/// This is the standard way of negotiating and establishing an association
/// with a requesting node. The outcome is a [`ServerAssociation`]. Unlike
/// [`ClientAssociationOptions`](super::client::ClientAssociationOptions), a
/// value of this type can be reused for multiple connections.
///
/// The SCP only accepts the transfer syntaxes it was explicitly configured
/// with via [`with_transfer_syntax`](Self::with_transfer_syntax); this crate
/// does not carry a transfer syntax registry of its own (see
/// SPEC_FULL.md's treatment of the dataset as an opaque payload).
///
/// Access control logic is also available, enabling application entities to
/// decide whether to accept or reject an association request based on the
/// called and calling AE titles.
///
/// - By default, the application accepts requests from anyone ([`AcceptAny`]).
/// - To only accept requests with a matching called AE title, call
///   [`accept_called_ae_title`](Self::accept_called_ae_title) ([`AcceptCalledAeTitle`]).
/// - Any other policy can be implemented through the [`AccessControl`] trait.
///
/// ## Basic usage
///
/// ```no_run
/// # use std::net::TcpListener;
/// # use dicom_ulp::association::server::ServerAssociationOptions;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// # let tcp_listener: TcpListener = unimplemented!();
/// let scp_options = ServerAssociationOptions::new()
///     .with_abstract_syntax("1.2.840.10008.1.1")
///     .with_transfer_syntax("1.2.840.10008.1.2");
///
/// let (stream, _address) = tcp_listener.accept()?;
/// scp_options.establish(stream)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerAssociationOptions<'a, A> {
    ae_access_control: A,
    ae_title: Cow<'a, str>,
    application_context_name: Cow<'a, str>,
    abstract_syntax_uids: Vec<Cow<'a, str>>,
    transfer_syntax_uids: Vec<Cow<'a, str>>,
    protocol_version: u16,
    max_pdu_length: u32,
    strict: bool,
    promiscuous: bool,
    socket_options: SocketOptions,
}

impl Default for ServerAssociationOptions<'_, AcceptAny> {
    fn default() -> Self {
        ServerAssociationOptions {
            ae_access_control: AcceptAny,
            ae_title: Cow::Borrowed("THIS-SCP"),
            application_context_name: Cow::Borrowed(crate::uids::APPLICATION_CONTEXT_NAME),
            abstract_syntax_uids: Vec::new(),
            transfer_syntax_uids: Vec::new(),
            protocol_version: 1,
            max_pdu_length: DEFAULT_MAX_PDU,
            strict: true,
            promiscuous: false,
            socket_options: SocketOptions::default(),
        }
    }
}

impl ServerAssociationOptions<'_, AcceptAny> {
    /// Create a new set of options for accepting associations.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'a, A> ServerAssociationOptions<'a, A>
where
    A: AccessControl,
{
    /// Change the access control policy to accept any association
    /// regardless of the specified AE titles.
    ///
    /// This is the default behavior when the options are first created.
    pub fn accept_any(self) -> ServerAssociationOptions<'a, AcceptAny> {
        self.ae_access_control(AcceptAny)
    }

    /// Change the access control policy to accept an association if the
    /// called AE title matches this node's AE title.
    pub fn accept_called_ae_title(self) -> ServerAssociationOptions<'a, AcceptCalledAeTitle> {
        self.ae_access_control(AcceptCalledAeTitle)
    }

    /// Change the access control policy.
    pub fn ae_access_control<P>(self, access_control: P) -> ServerAssociationOptions<'a, P>
    where
        P: AccessControl,
    {
        ServerAssociationOptions {
            ae_access_control: access_control,
            ae_title: self.ae_title,
            application_context_name: self.application_context_name,
            abstract_syntax_uids: self.abstract_syntax_uids,
            transfer_syntax_uids: self.transfer_syntax_uids,
            protocol_version: self.protocol_version,
            max_pdu_length: self.max_pdu_length,
            strict: self.strict,
            promiscuous: self.promiscuous,
            socket_options: self.socket_options,
        }
    }

    /// Define the application entity title referring to this DICOM node.
    ///
    /// The default is `THIS-SCP`.
    pub fn ae_title<T>(mut self, ae_title: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.ae_title = ae_title.into();
        self
    }

    /// Include this abstract syntax in the list of accepted presentation
    /// contexts.
    pub fn with_abstract_syntax<T>(mut self, abstract_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.abstract_syntax_uids.push(trim_uid(abstract_syntax_uid.into()));
        self
    }

    /// Include this transfer syntax in the list of accepted transfer
    /// syntaxes for every presentation context.
    pub fn with_transfer_syntax<T>(mut self, transfer_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.transfer_syntax_uids.push(trim_uid(transfer_syntax_uid.into()));
        self
    }

    /// Override the maximum PDU length that this node is willing to receive.
    pub fn max_pdu_length(mut self, value: u32) -> Self {
        self.max_pdu_length = value;
        self
    }

    /// Override strict mode: whether incoming PDUs must not surpass the
    /// negotiated maximum PDU length.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Override promiscuous mode: whether to accept abstract syntaxes that
    /// were not explicitly configured.
    pub fn promiscuous(mut self, promiscuous: bool) -> Self {
        self.promiscuous = promiscuous;
        self
    }

    /// Set a timeout for individual socket reads.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.socket_options.read_timeout = Some(timeout);
        self
    }

    /// Set a timeout for individual socket writes.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.socket_options.write_timeout = Some(timeout);
        self
    }

    /// Evaluate an incoming association request against this node's
    /// configuration, producing either the A-ASSOCIATE-AC to send back (and
    /// the negotiated options), or the rejection/abort PDU to send back
    /// along with the error to report.
    #[allow(clippy::result_large_err)]
    fn process_a_association_rq(
        &self,
        msg: Pdu,
    ) -> std::result::Result<(Pdu, NegotiatedOptions), (Pdu, Error)> {
        let AssociationRQ {
            protocol_version,
            calling_ae_title,
            called_ae_title,
            application_context_name,
            presentation_contexts,
            user_variables,
        } = match msg {
            Pdu::AssociationRQ(rq) => rq,
            Pdu::ReleaseRQ => {
                return Err((
                    Pdu::ReleaseRP,
                    Error::UnexpectedPdu { pdu_kind: "A-RELEASE-RQ" },
                ))
            }
            other => {
                return Err((
                    Pdu::AbortRQ {
                        source: AbortRQSource::ServiceProvider(
                            AbortRQServiceProviderReason::UnexpectedPdu,
                        ),
                    },
                    Error::UnexpectedPdu { pdu_kind: other.kind() },
                ))
            }
        };

        if protocol_version != self.protocol_version {
            let rj = AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::NoReasonGiven,
                ),
            };
            return Err((
                Pdu::AssociationRJ(rj.clone()),
                Error::Rejected { result: rj.result, source: rj.source },
            ));
        }

        if application_context_name != self.application_context_name {
            let rj = AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(
                    AssociationRJServiceUserReason::ApplicationContextNameNotSupported,
                ),
            };
            return Err((
                Pdu::AssociationRJ(rj.clone()),
                Error::Rejected { result: rj.result, source: rj.source },
            ));
        }

        let user_identity = user_variables.iter().find_map(|item| match item {
            UserVariableItem::UserIdentity(identity) => Some(identity),
            _ => None,
        });

        if let Err(reason) = self.ae_access_control.check_access(
            &self.ae_title,
            &calling_ae_title,
            &called_ae_title,
            user_identity,
        ) {
            let rj = AssociationRJ {
                result: AssociationRJResult::Permanent,
                source: AssociationRJSource::ServiceUser(reason),
            };
            return Err((
                Pdu::AssociationRJ(rj.clone()),
                Error::Rejected { result: rj.result, source: rj.source },
            ));
        }

        let requestor_max_pdu_length = user_variables
            .iter()
            .find_map(|item| match item {
                UserVariableItem::MaxLength(len) => Some(*len),
                _ => None,
            })
            .unwrap_or(DEFAULT_MAX_PDU);

        // treat 0 as practically unlimited
        let requestor_max_pdu_length = if requestor_max_pdu_length == 0 {
            u32::MAX
        } else {
            requestor_max_pdu_length
        };

        const NO_CONTEXT_TRANSFER_SYNTAX: &str = "1.2.840.10008.1.2";

        let presentation_contexts_negotiated: Vec<_> = presentation_contexts
            .into_iter()
            .map(|pc| {
                let abstract_syntax = trim_uid(Cow::from(pc.abstract_syntax));
                if !self.promiscuous && !self.abstract_syntax_uids.contains(&abstract_syntax) {
                    return PresentationContextNegotiated {
                        id: pc.id,
                        reason: PresentationContextResultReason::AbstractSyntaxNotSupported,
                        transfer_syntax: NO_CONTEXT_TRANSFER_SYNTAX.to_string(),
                        abstract_syntax: abstract_syntax.to_string(),
                    };
                }

                let (transfer_syntax, reason) = self
                    .choose_ts(&pc.transfer_syntaxes)
                    .map(|ts| (ts.to_string(), PresentationContextResultReason::Acceptance))
                    .unwrap_or_else(|| {
                        (
                            NO_CONTEXT_TRANSFER_SYNTAX.to_string(),
                            PresentationContextResultReason::TransferSyntaxesNotSupported,
                        )
                    });

                PresentationContextNegotiated {
                    id: pc.id,
                    reason,
                    transfer_syntax,
                    abstract_syntax: abstract_syntax.to_string(),
                }
            })
            .collect();

        let pdu = Pdu::AssociationAC(AssociationAC {
            protocol_version: self.protocol_version,
            application_context_name,
            presentation_contexts: presentation_contexts_negotiated
                .iter()
                .map(|pc| PresentationContextResult {
                    id: pc.id,
                    reason: pc.reason.clone(),
                    transfer_syntax: pc.transfer_syntax.clone(),
                })
                .collect(),
            calling_ae_title: calling_ae_title.clone(),
            called_ae_title,
            user_variables: vec![
                UserVariableItem::MaxLength(self.max_pdu_length),
                UserVariableItem::ImplementationClassUID(IMPLEMENTATION_CLASS_UID.to_string()),
                UserVariableItem::ImplementationVersionName(IMPLEMENTATION_VERSION_NAME.to_string()),
            ],
        });

        Ok((
            pdu,
            NegotiatedOptions {
                peer_max_pdu_length: requestor_max_pdu_length,
                user_variables,
                presentation_contexts: presentation_contexts_negotiated,
                peer_ae_title: calling_ae_title,
            },
        ))
    }

    /// Negotiate an association over the given TCP stream, already accepted
    /// by a [`TcpListener`](std::net::TcpListener).
    pub fn establish(&self, mut socket: TcpStream) -> Result<ServerAssociation> {
        ensure!(
            !self.abstract_syntax_uids.is_empty() || self.promiscuous,
            MissingAbstractSyntaxSnafu
        );

        socket
            .set_read_timeout(self.socket_options.read_timeout)
            .context(SetReadTimeoutSnafu)?;
        socket
            .set_write_timeout(self.socket_options.write_timeout)
            .context(SetWriteTimeoutSnafu)?;

        let msg = read_pdu(&mut socket, self.max_pdu_length, self.strict).context(ReceiveSnafu)?;

        match self.process_a_association_rq(msg) {
            Ok((pdu, negotiated)) => {
                write_pdu(&mut socket, &pdu).context(SendSnafu)?;
                Ok(ServerAssociation {
                    presentation_contexts: negotiated.presentation_contexts,
                    requestor_max_pdu_length: negotiated.peer_max_pdu_length,
                    acceptor_max_pdu_length: self.max_pdu_length,
                    socket,
                    peer_ae_title: negotiated.peer_ae_title,
                    user_variables: negotiated.user_variables,
                })
            }
            Err((pdu, err)) => {
                write_pdu(&mut socket, &pdu).context(SendSnafu)?;
                Err(err)
            }
        }
    }

    /// From a sequence of transfer syntaxes proposed by the requestor,
    /// choose the first one that is also in this node's accepted list
    /// (or, if the accepted list is empty, the first one proposed).
    fn choose_ts<I, T>(&self, it: I) -> Option<T>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str> + Clone,
    {
        if self.transfer_syntax_uids.is_empty() {
            return it.into_iter().next();
        }
        it.into_iter()
            .find(|ts| self.transfer_syntax_uids.iter().any(|accepted| accepted == ts.as_ref()))
    }
}

/// A DICOM upper layer association from the perspective of an accepting
/// application entity.
///
/// The most common operations of an established association are
/// [`send`](Self::send) and [`receive`](Self::receive). Large P-Data
/// fragments are easier to produce through [`send_pdata`](Self::send_pdata).
#[derive(Debug)]
pub struct ServerAssociation {
    presentation_contexts: Vec<PresentationContextNegotiated>,
    requestor_max_pdu_length: u32,
    acceptor_max_pdu_length: u32,
    socket: TcpStream,
    peer_ae_title: String,
    user_variables: Vec<UserVariableItem>,
}

impl Association for ServerAssociation {
    fn presentation_contexts(&self) -> &[PresentationContextNegotiated] {
        &self.presentation_contexts
    }

    fn acceptor_max_pdu_length(&self) -> u32 {
        self.acceptor_max_pdu_length
    }

    fn requestor_max_pdu_length(&self) -> u32 {
        self.requestor_max_pdu_length
    }

    fn peer_ae_title(&self) -> &str {
        &self.peer_ae_title
    }

    fn user_variables(&self) -> &[UserVariableItem] {
        &self.user_variables
    }
}

impl ServerAssociation {
    /// Send a PDU message to the requestor.
    pub fn send(&mut self, msg: &Pdu) -> Result<()> {
        write_pdu(&mut self.socket, msg).context(SendSnafu)
    }

    /// Read a PDU message from the requestor.
    pub fn receive(&mut self) -> Result<Pdu> {
        read_pdu(&mut self.socket, self.requestor_max_pdu_length, true).context(ReceiveSnafu)
    }

    /// Start a P-Data writer for sending one or more data fragments over
    /// the given presentation context.
    pub fn send_pdata(&mut self, presentation_context_id: u8) -> super::pdata::PDataWriter<&mut TcpStream> {
        super::pdata::PDataWriter::new(
            &mut self.socket,
            presentation_context_id,
            self.requestor_max_pdu_length,
        )
    }

    /// Start a P-Data writer for sending a command set over the given
    /// presentation context, fragmented the same way as a dataset.
    pub(crate) fn send_command_pdata(
        &mut self,
        presentation_context_id: u8,
    ) -> super::pdata::PDataWriter<&mut TcpStream> {
        super::pdata::PDataWriter::with_value_type(
            &mut self.socket,
            presentation_context_id,
            self.requestor_max_pdu_length,
            crate::pdu::PDataValueType::Command,
        )
    }

    /// Acknowledge an `A-RELEASE-RQ` received from the requestor by sending
    /// back `A-RELEASE-RP` and shutting down the transport.
    pub fn release(&mut self) -> Result<()> {
        write_pdu(&mut self.socket, &Pdu::ReleaseRP).context(SendSnafu)?;
        let _ = self.socket.shutdown(std::net::Shutdown::Both);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choose_ts_prefers_accepted_list() {
        let options = ServerAssociationOptions::new()
            .with_abstract_syntax("1.2.840.10008.1.1")
            .with_transfer_syntax("1.2.840.10008.1.2");

        assert_eq!(
            options.choose_ts(["1.2.840.10008.1.2.1", "1.2.840.10008.1.2"]),
            Some("1.2.840.10008.1.2"),
        );
        assert_eq!(options.choose_ts(["1.2.840.10008.1.2.1"]), None);
    }

    #[test]
    fn choose_ts_accepts_first_proposed_when_unconfigured() {
        let options = ServerAssociationOptions::new().with_abstract_syntax("1.2.840.10008.1.1");
        assert_eq!(
            options.choose_ts(["1.2.840.10008.1.2.1", "1.2.840.10008.1.2"]),
            Some("1.2.840.10008.1.2.1"),
        );
    }
}
