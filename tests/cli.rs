use std::{
    io::Read,
    net::TcpListener,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use devserve::config::DEFAULT_PORT;

const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_port_in_use_is_fatal() {
    // if something else already holds the port the binary fails all the same
    let _holder = TcpListener::bind(("0.0.0.0", DEFAULT_PORT)).ok();

    let mut child = Command::new(env!("CARGO_BIN_EXE_devserve"))
        .env("RUST_LOG", "info")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + EXIT_TIMEOUT;
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("server kept running with port {DEFAULT_PORT} taken");
        }
        thread::sleep(Duration::from_millis(20));
    };

    let mut stderr = String::new();
    child
        .stderr
        .take()
        .unwrap()
        .read_to_string(&mut stderr)
        .unwrap();
    assert!(!status.success(), "exit status {status}");
    assert_eq!(status.code(), Some(1));
    assert!(stderr.contains("ERROR"), "{stderr}");
    assert!(stderr.contains("failed to bind"), "{stderr}");
}
