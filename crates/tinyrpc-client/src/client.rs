use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_util::codec::Framed;

use tinyrpc_common::transport::tcp::{self, with_timeout, DEFAULT_TIMEOUT};
use tinyrpc_common::transport::MessageCodec;
use tinyrpc_common::{Message, OpCode, Result, RpcError, RpcPayload};

/// A function resolved by [`RpcClient::find`].
///
/// Carries only the resolved name, which is sent back as the target of
/// each [`RpcClient::call`]. It holds no connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHandle {
    name: String,
}

impl RemoteHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// TinyRPC client.
///
/// Holds only the server address. Creates a fresh TCP connection for each
/// request, so calls from different tasks proceed in parallel.
///
/// # Example
///
/// ```no_run
/// use tinyrpc_client::RpcClient;
/// use tinyrpc_common::RpcPayload;
///
/// # async fn run() -> tinyrpc_common::Result<()> {
/// let client = RpcClient::new("::1", 3000)?;
/// let double = client.find("double").await?;
/// let result = client.call(&double, &RpcPayload::from_integer(21)).await?;
/// assert_eq!(result.integer(), 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RpcClient {
    server_addr: SocketAddr,
    timeout: Option<Duration>,
}

impl RpcClient {
    /// Creates a client for the server at `address:port`.
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `address` is not an IPv4 or IPv6 address.
    pub fn new(address: &str, port: u16) -> Result<Self> {
        let ip: IpAddr = address.trim().parse().map_err(|e| {
            RpcError::InvalidArgument(format!("Invalid server address '{}': {}", address, e))
        })?;

        Ok(Self {
            server_addr: SocketAddr::new(ip, port),
            timeout: Some(DEFAULT_TIMEOUT),
        })
    }

    /// Sets the deadline for connecting and for each read or write.
    /// `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Resolves a function by name.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `name` is empty (no I/O is attempted)
    /// - `NotFound` if the server has no function with that name
    /// - a transport error if the exchange fails
    pub async fn find(&self, name: &str) -> Result<RemoteHandle> {
        if name.is_empty() {
            return Err(RpcError::InvalidArgument(
                "function name must not be empty".to_string(),
            ));
        }

        let response = self.exchange(Message::find(name), false).await?;
        match response.op {
            OpCode::Success => {
                tracing::debug!("Resolved function: {}", response.name);
                Ok(RemoteHandle {
                    name: response.name,
                })
            }
            _ => Err(RpcError::NotFound(name.to_string())),
        }
    }

    /// Invokes a resolved function.
    ///
    /// The payload is validated before any connection is opened.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` / `MalformedPayload` if `payload` is invalid
    /// - `NotFound` if the server answered with an error: the function is
    ///   gone or its handler failed
    /// - a transport error if the exchange fails
    pub async fn call(&self, handle: &RemoteHandle, payload: &RpcPayload) -> Result<RpcPayload> {
        payload.validate()?;

        let response = self
            .exchange(Message::call(handle.name.clone(), payload.clone()), true)
            .await?;

        match response.op {
            OpCode::Success => response.payload.ok_or_else(|| {
                RpcError::MalformedMessage("success response without a payload".to_string())
            }),
            _ => Err(RpcError::NotFound(handle.name.clone())),
        }
    }

    /// Releases the client.
    pub fn close(self) {
        tracing::trace!("Closing client for {}", self.server_addr);
    }

    /// Sends one request on a fresh connection and reads its response.
    ///
    /// The connection is closed when this returns, on every path.
    async fn exchange(&self, request: Message, expect_payload: bool) -> Result<Message> {
        let stream = tcp::connect(self.server_addr, self.timeout).await?;
        let mut framed = Framed::new(stream, MessageCodec::response(expect_payload));

        with_timeout(self.timeout, framed.send(request)).await?;

        with_timeout(self.timeout, async { framed.next().await.transpose() })
            .await?
            .ok_or_else(|| {
                RpcError::Transport("connection closed before a response arrived".to_string())
            })
    }
}
