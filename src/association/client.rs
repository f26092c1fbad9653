//! Association requestor module
//!
//! The module provides an abstraction for a DICOM association
//! in which this application entity initiates the request,
//! negotiating the terms of a new association with an acceptor.
//! See [`ClientAssociationOptions`] for details and examples on how to
//! create an association.

use std::borrow::Cow;
use std::net::{TcpStream, ToSocketAddrs};

use snafu::{ensure, ResultExt};

use crate::association::{
    Association, ConnectSnafu, MissingAbstractSyntaxSnafu, NoAcceptedPresentationContextsSnafu,
    ProtocolVersionMismatchSnafu, ReceiveSnafu, RejectedSnafu, Result, SendSnafu, SetReadTimeoutSnafu,
    SetWriteTimeoutSnafu, SocketOptions, UnexpectedPduSnafu,
};
use crate::pdu::{
    read_pdu, write_pdu, AssociationRJ, AssociationRQ, Pdu, PresentationContextNegotiated,
    PresentationContextProposed, UserIdentity, UserVariableItem, DEFAULT_MAX_PDU,
};
use crate::{IMPLEMENTATION_CLASS_UID, IMPLEMENTATION_VERSION_NAME};

/// A DICOM association builder for a requesting DICOM node,
/// often taking the role of a service class user (SCU).
///
/// This is the standard way of establishing an active association
/// with another node. The outcome is a [`ClientAssociation`].
/// A value of this type is consumed once an association attempt is made.
///
/// ## Basic usage
///
/// ```no_run
/// # use dicom_ulp::ClientAssociationOptions;
/// # fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let association = ClientAssociationOptions::new()
///     .with_abstract_syntax("1.2.840.10008.1.1")
///     .calling_ae_title("THIS-SCU")
///     .establish("remote-node.example:104")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientAssociationOptions<'a> {
    application_context_name: Cow<'a, str>,
    calling_ae_title: Cow<'a, str>,
    called_ae_title: Cow<'a, str>,
    abstract_syntax_uids: Vec<Cow<'a, str>>,
    transfer_syntax_uids: Vec<Cow<'a, str>>,
    protocol_version: u16,
    max_pdu_length: u32,
    user_identity: Option<UserIdentity>,
    socket_options: SocketOptions,
}

impl Default for ClientAssociationOptions<'_> {
    fn default() -> Self {
        ClientAssociationOptions {
            application_context_name: Cow::Borrowed(crate::uids::APPLICATION_CONTEXT_NAME),
            calling_ae_title: Cow::Borrowed("THIS-SCU"),
            called_ae_title: Cow::Borrowed("ANY-SCP"),
            abstract_syntax_uids: Vec::new(),
            transfer_syntax_uids: vec![Cow::Borrowed(crate::uids::IMPLICIT_VR_LITTLE_ENDIAN)],
            protocol_version: 1,
            max_pdu_length: DEFAULT_MAX_PDU,
            user_identity: None,
            socket_options: SocketOptions::default(),
        }
    }
}

impl<'a> ClientAssociationOptions<'a> {
    /// Create a new set of options for establishing an association.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define the calling application entity title for the association,
    /// overriding the default of `THIS-SCU`.
    pub fn calling_ae_title<T>(mut self, calling_ae_title: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.calling_ae_title = calling_ae_title.into();
        self
    }

    /// Define the called application entity title for the association,
    /// overriding the default of `ANY-SCP`.
    pub fn called_ae_title<T>(mut self, called_ae_title: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.called_ae_title = called_ae_title.into();
        self
    }

    /// Include this abstract syntax in the list of proposed presentation
    /// contexts.
    pub fn with_abstract_syntax<T>(mut self, abstract_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.abstract_syntax_uids.push(abstract_syntax_uid.into());
        self
    }

    /// Include this transfer syntax in the proposed list of each
    /// presentation context.
    pub fn with_transfer_syntax<T>(mut self, transfer_syntax_uid: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        self.transfer_syntax_uids.push(transfer_syntax_uid.into());
        self
    }

    /// Propose a user identity for the association (PS3.7 Annex D.3.3.7).
    pub fn user_identity(mut self, user_identity: UserIdentity) -> Self {
        self.user_identity = Some(user_identity);
        self
    }

    /// Override the maximum PDU length that this node is willing to receive.
    pub fn max_pdu_length(mut self, value: u32) -> Self {
        self.max_pdu_length = value;
        self
    }

    /// Set a timeout for individual socket reads.
    pub fn read_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.socket_options.read_timeout = Some(timeout);
        self
    }

    /// Set a timeout for individual socket writes.
    pub fn write_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.socket_options.write_timeout = Some(timeout);
        self
    }

    /// Initiate the TCP connection to `address` and negotiate the
    /// association.
    pub fn establish<A>(self, address: A) -> Result<ClientAssociation>
    where
        A: ToSocketAddrs,
    {
        ensure!(!self.abstract_syntax_uids.is_empty(), MissingAbstractSyntaxSnafu);

        let mut socket = TcpStream::connect(address).context(ConnectSnafu)?;
        socket
            .set_read_timeout(self.socket_options.read_timeout)
            .context(SetReadTimeoutSnafu)?;
        socket
            .set_write_timeout(self.socket_options.write_timeout)
            .context(SetWriteTimeoutSnafu)?;

        let rq = self.build_request_pdu();
        write_pdu(&mut socket, &rq).context(SendSnafu)?;

        let pdu = read_pdu(&mut socket, self.max_pdu_length, true).context(ReceiveSnafu)?;
        self.handle_response(pdu, socket)
    }

    fn build_request_pdu(&self) -> Pdu {
        let presentation_contexts = self
            .abstract_syntax_uids
            .iter()
            .enumerate()
            .map(|(i, abstract_syntax)| PresentationContextProposed {
                id: (i as u8) * 2 + 1,
                abstract_syntax: abstract_syntax.to_string(),
                transfer_syntaxes: self.transfer_syntax_uids.iter().map(|t| t.to_string()).collect(),
            })
            .collect();

        let mut user_variables = vec![
            UserVariableItem::MaxLength(self.max_pdu_length),
            UserVariableItem::ImplementationClassUID(IMPLEMENTATION_CLASS_UID.to_string()),
            UserVariableItem::ImplementationVersionName(IMPLEMENTATION_VERSION_NAME.to_string()),
        ];
        if let Some(identity) = &self.user_identity {
            user_variables.push(UserVariableItem::UserIdentity(identity.clone()));
        }

        Pdu::AssociationRQ(AssociationRQ {
            protocol_version: self.protocol_version,
            calling_ae_title: self.calling_ae_title.to_string(),
            called_ae_title: self.called_ae_title.to_string(),
            application_context_name: self.application_context_name.to_string(),
            presentation_contexts,
            user_variables,
        })
    }

    fn handle_response(&self, pdu: Pdu, socket: TcpStream) -> Result<ClientAssociation> {
        match pdu {
            Pdu::AssociationAC(ac) => {
                ensure!(
                    ac.protocol_version == self.protocol_version,
                    ProtocolVersionMismatchSnafu {
                        their_version: ac.protocol_version,
                    }
                );

                let mut peer_max_pdu_length = DEFAULT_MAX_PDU;
                for uv in &ac.user_variables {
                    if let UserVariableItem::MaxLength(len) = uv {
                        peer_max_pdu_length = *len;
                    }
                }

                let abstract_syntax_by_id: std::collections::HashMap<u8, String> = self
                    .abstract_syntax_uids
                    .iter()
                    .enumerate()
                    .map(|(i, uid)| ((i as u8) * 2 + 1, uid.to_string()))
                    .collect();

                let presentation_contexts: Vec<PresentationContextNegotiated> = ac
                    .presentation_contexts
                    .into_iter()
                    .map(|pc| PresentationContextNegotiated {
                        abstract_syntax: abstract_syntax_by_id.get(&pc.id).cloned().unwrap_or_default(),
                        id: pc.id,
                        reason: pc.reason,
                        transfer_syntax: pc.transfer_syntax,
                    })
                    .collect();

                ensure!(
                    presentation_contexts.iter().any(|pc| pc.is_accepted()),
                    NoAcceptedPresentationContextsSnafu
                );

                Ok(ClientAssociation {
                    presentation_contexts,
                    acceptor_max_pdu_length: peer_max_pdu_length,
                    requestor_max_pdu_length: self.max_pdu_length,
                    socket,
                    user_variables: ac.user_variables,
                })
            }
            Pdu::AssociationRJ(AssociationRJ { result, source }) => {
                RejectedSnafu { result, source }.fail()
            }
            other => UnexpectedPduSnafu { pdu_kind: other.kind() }.fail(),
        }
    }
}

/// A DICOM upper level association from the perspective of a requesting
/// application entity.
///
/// The most common operations of an established association are
/// [`send`](Self::send) and [`receive`](Self::receive). Large P-Data
/// fragments are easier to produce through [`send_pdata`](Self::send_pdata).
///
/// When the value falls out of scope, the program will attempt a graceful
/// release of the association.
#[derive(Debug)]
pub struct ClientAssociation {
    presentation_contexts: Vec<PresentationContextNegotiated>,
    acceptor_max_pdu_length: u32,
    requestor_max_pdu_length: u32,
    socket: TcpStream,
    user_variables: Vec<UserVariableItem>,
}

impl Association for ClientAssociation {
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
        // the AC PDU does not echo back the acceptor's own title; a caller
        // that needs it already knows it from the options it configured.
        ""
    }

    fn user_variables(&self) -> &[UserVariableItem] {
        &self.user_variables
    }
}

impl ClientAssociation {
    /// Send a PDU message to the acceptor.
    pub fn send(&mut self, msg: &Pdu) -> Result<()> {
        write_pdu(&mut self.socket, msg).context(SendSnafu)
    }

    /// Read a PDU message from the acceptor.
    pub fn receive(&mut self) -> Result<Pdu> {
        read_pdu(&mut self.socket, self.acceptor_max_pdu_length, true).context(ReceiveSnafu)
    }

    /// Start a P-Data writer for sending one or more data fragments over
    /// the given presentation context.
    pub fn send_pdata(&mut self, presentation_context_id: u8) -> super::pdata::PDataWriter<&mut TcpStream> {
        super::pdata::PDataWriter::new(&mut self.socket, presentation_context_id, self.acceptor_max_pdu_length)
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
            self.acceptor_max_pdu_length,
            crate::pdu::PDataValueType::Command,
        )
    }

    /// Gracefully release the association.
    pub fn release(&mut self) -> Result<()> {
        write_pdu(&mut self.socket, &Pdu::ReleaseRQ).context(SendSnafu)?;
        let pdu = read_pdu(&mut self.socket, self.acceptor_max_pdu_length, true).context(ReceiveSnafu)?;
        match pdu {
            Pdu::ReleaseRP => {
                let _ = self.socket.shutdown(std::net::Shutdown::Both);
                Ok(())
            }
            other => UnexpectedPduSnafu { pdu_kind: other.kind() }.fail(),
        }
    }
}

impl Drop for ClientAssociation {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
