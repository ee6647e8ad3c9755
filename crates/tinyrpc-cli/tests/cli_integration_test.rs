//! CLI Integration Tests
//!
//! Runs the `tinyrpc` binary against an in-process server that exposes the
//! built-in functions.
//!
//! Test Scenarios:
//! 1. `find` prints the resolved name
//! 2. `call` prints one JSON line
//! 3. Failures exit non-zero with a message on stderr
//!
//! All addresses use `127.0.0.1` so the tests do not depend on IPv6.

use std::net::SocketAddr;
use std::process::{Command, Output};
use tinyrpc_server::{RpcServer, ServerHandle};

// ============================================================================
// Test Helpers
// ============================================================================

/// Starts a server with the built-in functions on an ephemeral port.
async fn start_server() -> (SocketAddr, ServerHandle) {
    let server = RpcServer::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    tinyrpc_cli::builtins::register_builtins(server.registry()).unwrap();
    let addr = server.local_addr().unwrap();
    let handle = server.handle();
    tokio::spawn(async move {
        let _ = server.serve_all().await;
    });
    (addr, handle)
}

/// Runs the binary off the async runtime so the server keeps serving.
async fn run_tinyrpc(args: Vec<String>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_tinyrpc"))
            .args(&args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn args(addr: SocketAddr, rest: &[&str]) -> Vec<String> {
    let mut out = vec![rest[0].to_string(), addr.ip().to_string(), addr.port().to_string()];
    out.extend(rest[1..].iter().map(|s| s.to_string()));
    out
}

// ============================================================================
// find
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_find_prints_name() {
    let (addr, handle) = start_server().await;

    let output = run_tinyrpc(args(addr, &["find", "double"])).await;
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "double");

    handle.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_find_missing_function_fails() {
    let (addr, handle) = start_server().await;

    let output = run_tinyrpc(args(addr, &["find", "nope"])).await;
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(!output.stderr.is_empty());

    handle.stop();
}

// ============================================================================
// call
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_call_double() {
    let (addr, handle) = start_server().await;

    let output = run_tinyrpc(args(addr, &["call", "double", "-i", "21"])).await;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"integer":42,"bytes_len":0,"data":""}"#
    );

    handle.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_reverse_bytes() {
    let (addr, handle) = start_server().await;

    let output = run_tinyrpc(args(addr, &["call", "reverse", "-i", "3", "-d", "hello"])).await;
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"integer":3,"bytes_len":5,"data":"olleh"}"#
    );

    handle.stop();
}

// ============================================================================
// Error handling
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_call_invalid_address_fails() {
    let output = run_tinyrpc(vec![
        "call".into(),
        "not-an-ip".into(),
        "3000".into(),
        "double".into(),
    ])
    .await;
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_unknown_subcommand_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_tinyrpc"))
        .arg("bogus")
        .output()
        .unwrap();
    assert!(!output.status.success());
}
