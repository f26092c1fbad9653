//! Test suite for sending and receiving a full C-STORE interaction,
//! exercising PDV fragmentation of a large dataset across several PDUs.
use dicom_ulp::association::{client::ClientAssociationOptions, server::ServerAssociationOptions, Association};
use dicom_ulp::dimse::store::{c_store, receive_c_store, respond_c_store};
use dicom_ulp::pdu::commands::Priority;
use dicom_ulp::pdu::{Pdu, PresentationContextNegotiated, PresentationContextResultReason};
use dicom_ulp::ServerAssociation;
use std::net::SocketAddr;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync + 'static>>;

static SCU_AE_TITLE: &str = "STORE-SCU";
static SCP_AE_TITLE: &str = "STORE-SCP";

static IMPLICIT_VR_LE: &str = "1.2.840.10008.1.2";
static SC_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.7";

/// Create a store SCP which accepts one C-STORE interaction.
fn spawn_store_scp() -> Result<(std::thread::JoinHandle<Result<ServerAssociation>>, SocketAddr)> {
    let listener = std::net::TcpListener::bind("localhost:0")?;
    let addr = listener.local_addr()?;
    let scp = ServerAssociationOptions::new()
        .accept_called_ae_title()
        .ae_title(SCP_AE_TITLE)
        .max_pdu_length(4096)
        .with_abstract_syntax(SC_IMAGE_STORAGE)
        .with_transfer_syntax(IMPLICIT_VR_LE);

    let h = std::thread::spawn(move || -> Result<_> {
        let (stream, _addr) = listener.accept()?;
        let mut association = scp.establish(stream)?;

        assert_eq!(
            association.presentation_contexts(),
            &[PresentationContextNegotiated {
                id: 1,
                reason: PresentationContextResultReason::Acceptance,
                abstract_syntax: SC_IMAGE_STORAGE.to_string(),
                transfer_syntax: IMPLICIT_VR_LE.to_string(),
            }],
        );

        // handle a full C-STORE-RQ interaction, dataset larger than one PDU
        let (context_id, rq) = receive_c_store(&mut association)?;
        assert_eq!(rq.affected_sop_class_uid, SC_IMAGE_STORAGE);
        assert_eq!(rq.dataset.len(), 10_000);
        assert!(rq.dataset.iter().all(|&b| b == 0x5c));

        respond_c_store(
            &mut association,
            context_id,
            rq.message_id,
            &rq.affected_sop_class_uid,
            &rq.affected_sop_instance_uid,
            0x0000,
        )?;

        // handle one release request
        let pdu = association.receive()?;
        assert_eq!(pdu, Pdu::ReleaseRQ);
        association.send(&Pdu::ReleaseRP)?;

        Ok(association)
    });
    Ok((h, addr))
}

/// Run an SCP and an SCU concurrently, negotiate an association, make a
/// single C-STORE interaction whose dataset spans several P-DATA-TF PDUs,
/// and release the association.
#[test]
fn store_scu_scp_association_test() {
    let (scp_handle, scp_addr) = spawn_store_scp().unwrap();

    let mut association = ClientAssociationOptions::new()
        .calling_ae_title(SCU_AE_TITLE)
        .called_ae_title(SCP_AE_TITLE)
        .with_abstract_syntax(SC_IMAGE_STORAGE)
        .with_transfer_syntax(IMPLICIT_VR_LE)
        .max_pdu_length(4096)
        .establish(scp_addr)
        .unwrap();

    assert_eq!(
        association.presentation_contexts(),
        &[PresentationContextNegotiated {
            id: 1,
            abstract_syntax: SC_IMAGE_STORAGE.to_string(),
            transfer_syntax: IMPLICIT_VR_LE.to_string(),
            reason: PresentationContextResultReason::Acceptance,
        }]
    );

    let iuid = "2.25.74320942257366560001029850331948705672";
    let dataset = vec![0x5c_u8; 10_000];

    let status = c_store(&mut association, 1, 1, SC_IMAGE_STORAGE, iuid, Priority::Medium, &dataset)
        .expect("C-STORE failed");
    assert_eq!(status, 0x0000);

    association
        .release()
        .expect("did not have a peaceful release");

    scp_handle
        .join()
        .expect("SCP panicked")
        .expect("Error at the SCP");
}
