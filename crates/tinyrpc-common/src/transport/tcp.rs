use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;

use crate::protocol::error::{Result, RpcError};

/// Default deadline for connecting and for each read or write (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connects to a remote endpoint.
///
/// # Arguments
///
/// * `addr` - The server address
/// * `timeout` - Deadline for establishing the connection; `None` waits
///   for the operating system's own connect timeout
///
/// # Returns
///
/// A connected stream with `TCP_NODELAY` set, since every exchange is a
/// single small request followed by a single response.
///
/// # Errors
///
/// Returns `Transport` if the connection is refused or reset, and `Timeout`
/// if the deadline passes first.
pub async fn connect(addr: SocketAddr, timeout: Option<Duration>) -> Result<TcpStream> {
    let stream = with_timeout(timeout, async {
        TcpStream::connect(addr)
            .await
            .map_err(|e| map_io_error(e, &format!("connecting to {}", addr)))
    })
    .await?;

    stream
        .set_nodelay(true)
        .map_err(|e| map_io_error(e, "setting TCP_NODELAY"))?;

    tracing::trace!("Connected to {}", addr);
    Ok(stream)
}

/// Runs one I/O step under an optional deadline.
///
/// Expiry is reported as `Timeout` with the deadline in milliseconds.
pub async fn with_timeout<T, F>(timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RpcError::Timeout(limit.as_millis() as u64))?,
        None => fut.await,
    }
}

/// Map IO errors to appropriate RpcError variants
///
/// - Connection errors and socket-level timeouts -> `Transport`
/// - Other IO errors -> `Io`
pub fn map_io_error(err: std::io::Error, context: &str) -> RpcError {
    match err.kind() {
        ErrorKind::TimedOut
        | ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof => RpcError::Transport(format!("{}: {}", context, err)),
        _ => RpcError::Io(err),
    }
}
