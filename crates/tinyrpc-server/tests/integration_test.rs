// Integration tests for tinyrpc-server
//
// These tests start a real TCP server and talk to it with a raw-byte client
// that builds frames by hand, so the wire layout is checked independently
// of the codec.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tinyrpc_common::{RpcPayload, MAX_PAYLOAD_LEN};
use tinyrpc_server::{RpcServer, ServerConfig, ServerHandle};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

// ============================================================================
// Test Helpers
// ============================================================================

const OP_ERROR: i32 = 0;
const OP_SUCCESS: i32 = 1;
const OP_FIND: i32 = 2;
const OP_CALL: i32 = 3;

/// Starts a server with a few functions and returns its address.
async fn start_server(config: ServerConfig) -> (SocketAddr, ServerHandle) {
    let server = RpcServer::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap()
        .with_config(config)
        .unwrap();

    server
        .register("double", |p: RpcPayload| Some(RpcPayload::from_integer(p.integer() * 2)))
        .unwrap();
    server.register("echo", |p: RpcPayload| Some(p)).unwrap();
    server
        .register("slow", |p: RpcPayload| {
            std::thread::sleep(Duration::from_millis(300));
            Some(p)
        })
        .unwrap();

    let addr = server.local_addr().unwrap();
    let handle = server.handle();
    let server = Arc::new(server);
    tokio::spawn(async move { server.serve_all().await });

    (addr, handle)
}

/// Builds a frame by hand.
fn frame(op: i32, name: &[u8], payload: Option<(i64, &[u8])>) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&op.to_be_bytes());
    buf.extend_from_slice(&(name.len() as u32).to_be_bytes());
    let payload_len = payload.map_or(0, |(_, bytes)| bytes.len() as u32);
    buf.extend_from_slice(&payload_len.to_be_bytes());
    buf.extend_from_slice(name);
    if let Some((integer, bytes)) = payload {
        buf.extend_from_slice(&integer.to_be_bytes());
        buf.extend_from_slice(bytes);
    }
    buf
}

/// Raw response header plus the name.
struct RawResponse {
    op: i32,
    name: String,
    payload_len: u32,
    stream: TcpStream,
}

impl RawResponse {
    async fn read(mut stream: TcpStream) -> Self {
        let op = stream.read_i32().await.unwrap();
        let name_len = stream.read_u32().await.unwrap();
        let payload_len = stream.read_u32().await.unwrap();
        let mut name = vec![0u8; name_len as usize];
        stream.read_exact(&mut name).await.unwrap();
        Self {
            op,
            name: String::from_utf8(name).unwrap(),
            payload_len,
            stream,
        }
    }

    async fn read_payload(&mut self) -> (i64, Vec<u8>) {
        let integer = self.stream.read_i64().await.unwrap();
        let mut bytes = vec![0u8; self.payload_len as usize];
        self.stream.read_exact(&mut bytes).await.unwrap();
        (integer, bytes)
    }

    /// Asserts the server closed the connection with nothing left to read.
    async fn assert_closed(mut self) {
        let mut rest = Vec::new();
        self.stream.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty(), "unexpected trailing bytes: {:?}", rest);
    }
}

async fn send_raw(addr: SocketAddr, bytes: &[u8]) -> TcpStream {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(bytes).await.unwrap();
    stream.flush().await.unwrap();
    stream
}

// ============================================================================
// Wire-level exchanges
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_success_has_name_and_no_payload() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let stream = send_raw(addr, &frame(OP_FIND, b"double", Some((0, b"")))).await;
    let response = RawResponse::read(stream).await;

    assert_eq!(response.op, OP_SUCCESS);
    assert_eq!(response.name, "double");
    assert_eq!(response.payload_len, 0);
    response.assert_closed().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_find_missing_is_error_with_empty_name() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let stream = send_raw(addr, &frame(OP_FIND, b"missing", Some((0, b"")))).await;
    let response = RawResponse::read(stream).await;

    assert_eq!(response.op, OP_ERROR);
    assert!(response.name.is_empty());
    assert_eq!(response.payload_len, 0);
    response.assert_closed().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_call_success_carries_result() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let stream = send_raw(addr, &frame(OP_CALL, b"echo", Some((-42, b"bytes")))).await;
    let mut response = RawResponse::read(stream).await;

    assert_eq!(response.op, OP_SUCCESS);
    assert_eq!(response.name, "echo");
    assert_eq!(response.payload_len, 5);
    assert_eq!(response.read_payload().await, (-42, b"bytes".to_vec()));
    response.assert_closed().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_request_split_across_writes() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let bytes = frame(OP_CALL, b"double", Some((21, b"")));
    let mut stream = TcpStream::connect(addr).await.unwrap();
    for chunk in bytes.chunks(3) {
        stream.write_all(chunk).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut response = RawResponse::read(stream).await;
    assert_eq!(response.op, OP_SUCCESS);
    assert_eq!(response.read_payload().await, (42, Vec::new()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_oversized_payload_header_gets_error() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let mut header = Vec::new();
    header.extend_from_slice(&OP_CALL.to_be_bytes());
    header.extend_from_slice(&4u32.to_be_bytes());
    header.extend_from_slice(&((MAX_PAYLOAD_LEN + 1) as u32).to_be_bytes());

    let stream = send_raw(addr, &header).await;
    let response = RawResponse::read(stream).await;
    assert_eq!(response.op, OP_ERROR);
    assert!(response.name.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_operation_closes_without_response() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let mut stream = send_raw(addr, &frame(99, b"double", Some((0, b"")))).await;
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;
    assert!(rest.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_one_request_per_connection() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let mut bytes = frame(OP_FIND, b"double", Some((0, b"")));
    bytes.extend(frame(OP_FIND, b"echo", Some((0, b""))));

    let stream = send_raw(addr, &bytes).await;
    let response = RawResponse::read(stream).await;
    assert_eq!(response.name, "double");

    // The second request is never answered
    let mut stream = response.stream;
    let mut rest = Vec::new();
    let _ = stream.read_to_end(&mut rest).await;
    assert!(rest.is_empty());
}

// ============================================================================
// Concurrency and lifecycle
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_handler_does_not_block_other_connections() {
    let (addr, _handle) = start_server(ServerConfig::default()).await;

    let slow = tokio::spawn(async move {
        let stream = send_raw(addr, &frame(OP_CALL, b"slow", Some((1, b"")))).await;
        RawResponse::read(stream).await.op
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let started = std::time::Instant::now();
    let stream = send_raw(addr, &frame(OP_FIND, b"echo", Some((0, b"")))).await;
    let response = RawResponse::read(stream).await;
    assert_eq!(response.op, OP_SUCCESS);
    assert!(started.elapsed() < Duration::from_millis(250));

    assert_eq!(slow.await.unwrap(), OP_SUCCESS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_idle_connection_is_closed_after_timeout() {
    let config = ServerConfig::new().with_io_timeout(Some(Duration::from_millis(100)));
    let (addr, _handle) = start_server(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut rest = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut rest)).await;
    assert!(read.is_ok(), "server kept an idle connection open");
    assert!(rest.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stopped_server_refuses_new_work() {
    let (addr, handle) = start_server(ServerConfig::default()).await;

    let stream = send_raw(addr, &frame(OP_FIND, b"echo", Some((0, b"")))).await;
    assert_eq!(RawResponse::read(stream).await.op, OP_SUCCESS);

    handle.stop();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.is_running());

    // The listener is gone once serve_all returns and the server is dropped
    let result = TcpStream::connect(addr).await;
    if let Ok(mut stream) = result {
        let mut rest = Vec::new();
        let _ = stream.read_to_end(&mut rest).await;
        assert!(rest.is_empty());
    }
}
