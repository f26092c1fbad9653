use std::io::Cursor;

use crate::pdu::*;

#[test]
fn can_read_write_associate_rq() {
    let association_rq = Pdu::AssociationRQ(AssociationRQ {
        protocol_version: 1,
        calling_ae_title: "CALLING_AE".to_string(),
        called_ae_title: "CALLED_AE".to_string(),
        application_context_name: crate::uids::APPLICATION_CONTEXT_NAME.to_string(),
        presentation_contexts: vec![
            PresentationContextProposed {
                id: 1,
                abstract_syntax: "abstract 1".to_string(),
                transfer_syntaxes: vec!["transfer 1".to_string(), "transfer 2".to_string()],
            },
            PresentationContextProposed {
                id: 3,
                abstract_syntax: "abstract 2".to_string(),
                transfer_syntaxes: vec!["transfer 3".to_string()],
            },
        ],
        user_variables: vec![
            UserVariableItem::ImplementationClassUID("class uid".to_string()),
            UserVariableItem::ImplementationVersionName("version name".to_string()),
            UserVariableItem::MaxLength(16_384),
        ],
    });

    let mut bytes = vec![];
    write_pdu(&mut bytes, &association_rq).unwrap();

    let result = read_pdu(&mut Cursor::new(&bytes), DEFAULT_MAX_PDU, true).unwrap();

    match result {
        Pdu::AssociationRQ(rq) => {
            assert_eq!(rq.protocol_version, 1);
            assert_eq!(rq.calling_ae_title, "CALLING_AE");
            assert_eq!(rq.called_ae_title, "CALLED_AE");
            assert_eq!(rq.application_context_name, crate::uids::APPLICATION_CONTEXT_NAME);
            assert_eq!(rq.presentation_contexts.len(), 2);
            assert_eq!(rq.presentation_contexts[0].transfer_syntaxes.len(), 2);
            assert_eq!(rq.presentation_contexts[1].transfer_syntaxes, vec!["transfer 3"]);
            assert_eq!(rq.user_variables.len(), 3);
        }
        other => panic!("expected AssociationRQ, got {other:?}"),
    }
}

#[test]
fn can_read_write_pdata() {
    let pdata = Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: 3,
            value_type: PDataValueType::Command,
            is_last: true,
            data: vec![1, 2, 3, 4],
        }],
    };

    let mut bytes = vec![];
    write_pdu(&mut bytes, &pdata).unwrap();

    let result = read_pdu(&mut Cursor::new(&bytes), DEFAULT_MAX_PDU, true).unwrap();

    match result {
        Pdu::PData { data } => {
            assert_eq!(data.len(), 1);
            assert_eq!(data[0].presentation_context_id, 3);
            assert_eq!(data[0].value_type, PDataValueType::Command);
            assert!(data[0].is_last);
            assert_eq!(data[0].data, vec![1, 2, 3, 4]);
        }
        other => panic!("expected PData, got {other:?}"),
    }
}

#[test]
fn can_read_write_release_and_abort() {
    let mut bytes = vec![];
    write_pdu(&mut bytes, &Pdu::ReleaseRQ).unwrap();
    assert!(matches!(
        read_pdu(&mut Cursor::new(&bytes), DEFAULT_MAX_PDU, true).unwrap(),
        Pdu::ReleaseRQ
    ));

    let mut bytes = vec![];
    let abort = Pdu::AbortRQ {
        source: AbortRQSource::ServiceProvider(AbortRQServiceProviderReason::UnexpectedPDU),
    };
    write_pdu(&mut bytes, &abort).unwrap();
    match read_pdu(&mut Cursor::new(&bytes), DEFAULT_MAX_PDU, true).unwrap() {
        Pdu::AbortRQ { source } => assert_eq!(
            source,
            AbortRQSource::ServiceProvider(AbortRQServiceProviderReason::UnexpectedPDU)
        ),
        other => panic!("expected AbortRQ, got {other:?}"),
    }
}

#[test]
fn rejects_pdu_larger_than_max() {
    let mut bytes = vec![];
    let pdata = Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: 1,
            value_type: PDataValueType::Data,
            is_last: true,
            data: vec![0; 5000],
        }],
    };
    write_pdu(&mut bytes, &pdata).unwrap();

    let err = read_pdu(&mut Cursor::new(&bytes), MINIMUM_PDU_SIZE, true).unwrap_err();
    assert!(matches!(err, reader::Error::PduTooLarge { .. }));
}
