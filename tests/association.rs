use dicom_dictionary_std::uids::VERIFICATION;
use dicom_ulp::ClientAssociationOptions;
use rstest::rstest;
use std::time::{Duration, Instant};

const TIMEOUT_TOLERANCE: u64 = 200;

/// A listener that accepts the TCP connection but never answers the
/// A-ASSOCIATE-RQ should cause the requestor to give up once its read
/// timeout elapses, rather than hang forever.
#[rstest]
#[case(100)]
#[case(300)]
fn test_read_timeout_on_unresponsive_peer(#[case] timeout_ms: u64) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = std::thread::spawn(move || {
        // accept and hold the connection open without ever answering
        let (_stream, _addr) = listener.accept().unwrap();
        std::thread::sleep(Duration::from_secs(2));
    });

    let scu_init = ClientAssociationOptions::new()
        .with_abstract_syntax(VERIFICATION)
        .calling_ae_title("RANDOM")
        .read_timeout(Duration::from_millis(timeout_ms));

    let now = Instant::now();
    let res = scu_init.establish(addr);
    let elapsed = now.elapsed();

    assert!(res.is_err());
    assert!(
        elapsed.as_millis() < (timeout_ms + TIMEOUT_TOLERANCE).into(),
        "Elapsed time {}ms exceeded the timeout {}ms plus tolerance",
        elapsed.as_millis(),
        timeout_ms
    );

    // don't block the test on the server thread's long sleep
    drop(handle);
}
