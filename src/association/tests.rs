use std::net::TcpListener;
use std::time::Duration;

use crate::pdu::commands::{Command, DatasetForbiddenCommand};
use crate::pdu::generated::CEchoRq;
use crate::pdu::{PDataValue, PDataValueType, Pdu};
use crate::{uids, ClientAssociationOptions};

use super::server::ServerAssociationOptions;

impl DatasetForbiddenCommand for CEchoRq<'_> {}

fn create_c_echo_command(message_id: u16) -> Vec<u8> {
    let rq = CEchoRq::builder()
        .message_id(message_id)
        .affected_sop_class_uid(uids::VERIFICATION)
        .build();
    rq.encode(false)
}

/// Once the association is established, either side should be able to send
/// and receive further PDUs without the connection getting out of sync.
#[test]
fn client_sends_and_receives_after_establish() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let server_addr = listener.local_addr().unwrap();

    let echo_pdu = Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: 1,
            data: create_c_echo_command(1),
            value_type: PDataValueType::Command,
            is_last: true,
        }],
    };
    let server_pdu = echo_pdu.clone();

    let server_handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let server_options = ServerAssociationOptions::new()
            .accept_any()
            .with_abstract_syntax(uids::VERIFICATION)
            .ae_title("THIS-SCP");
        let mut association = server_options.establish(stream).unwrap();
        association.send(&server_pdu).unwrap();
    });

    std::thread::sleep(Duration::from_millis(10));

    let scu_options = ClientAssociationOptions::new()
        .with_abstract_syntax(uids::VERIFICATION)
        .calling_ae_title("RANDOM")
        .called_ae_title("THIS-SCP")
        .read_timeout(Duration::from_secs(5));

    let mut association = scu_options.establish(server_addr).unwrap();
    let received_pdu = association.receive().unwrap();
    assert_eq!(received_pdu, echo_pdu);

    drop(association);
    server_handle.join().unwrap();
}

/// Symmetric to [`client_sends_and_receives_after_establish`]: the server
/// should see whatever the client sends right after establishment.
#[test]
fn server_receives_after_establish() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let server_addr = listener.local_addr().unwrap();

    let echo_pdu = Pdu::PData {
        data: vec![PDataValue {
            presentation_context_id: 1,
            data: create_c_echo_command(1),
            value_type: PDataValueType::Command,
            is_last: true,
        }],
    };
    let client_pdu = echo_pdu.clone();

    let server_handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let server_options = ServerAssociationOptions::new()
            .accept_any()
            .with_abstract_syntax(uids::VERIFICATION)
            .ae_title("THIS-SCP");
        let mut association = server_options.establish(stream).unwrap();
        let received_pdu = association.receive().unwrap();
        assert_eq!(received_pdu, echo_pdu);
    });

    std::thread::sleep(Duration::from_millis(10));

    let scu_options = ClientAssociationOptions::new()
        .with_abstract_syntax(uids::VERIFICATION)
        .calling_ae_title("RANDOM")
        .called_ae_title("THIS-SCP")
        .read_timeout(Duration::from_secs(5));

    let mut association = scu_options.establish(server_addr).unwrap();
    association.send(&client_pdu).unwrap();

    drop(association);
    server_handle.join().unwrap();
}
