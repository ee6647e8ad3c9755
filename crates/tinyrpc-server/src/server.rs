use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{Notify, Semaphore};

use tinyrpc_common::{Result, RpcError};

use crate::config::ServerConfig;
use crate::connection::handle_connection;
use crate::registry::{FunctionRegistry, Handler};

/// Pause after a failed `accept` so a persistent error (e.g. out of file
/// descriptors) does not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

struct RunState {
    running: AtomicBool,
    shutdown: Notify,
}

/// TinyRPC server.
///
/// Owns the listening socket and the function registry. [`RpcServer::serve_all`]
/// accepts connections and spawns one detached task per connection; the
/// accept loop never waits for a connection to finish.
///
/// Functions may be registered before or while serving.
pub struct RpcServer {
    listener: TcpListener,
    registry: Arc<FunctionRegistry>,
    config: ServerConfig,
    state: Arc<RunState>,
    connections: Arc<Semaphore>,
}

impl RpcServer {
    /// Creates a server listening on all interfaces on `port`.
    ///
    /// Binds the IPv6 wildcard address (which also accepts IPv4 on
    /// dual-stack hosts) and falls back to the IPv4 wildcard when IPv6 is
    /// unavailable. Port 0 picks a free port.
    ///
    /// # Errors
    ///
    /// Returns `Bind` if neither address can be bound.
    pub async fn init(port: u16) -> Result<Self> {
        let v6 = SocketAddr::from((Ipv6Addr::UNSPECIFIED, port));
        match Self::bind(v6).await {
            Ok(server) => Ok(server),
            Err(e) => {
                tracing::warn!("{}; falling back to IPv4", e);
                Self::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))).await
            }
        }
    }

    /// Creates a server listening on an explicit address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| RpcError::Bind(format!("{}: {}", addr, e)))?;

        let config = ServerConfig::default();
        Ok(Self {
            listener,
            registry: Arc::new(FunctionRegistry::new()),
            connections: Arc::new(Semaphore::new(config.max_connections)),
            config,
            state: Arc::new(RunState {
                running: AtomicBool::new(true),
                shutdown: Notify::new(),
            }),
        })
    }

    /// Replaces the server limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration fails validation.
    pub fn with_config(mut self, config: ServerConfig) -> Result<Self> {
        config.validate().map_err(RpcError::InvalidArgument)?;
        self.connections = Arc::new(Semaphore::new(config.max_connections));
        self.config = config;
        Ok(self)
    }

    /// Registers a function. See [`FunctionRegistry::register`].
    pub fn register<H: Handler>(&self, name: &str, handler: H) -> Result<()> {
        self.registry.register(name, handler)
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Gets the actual bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| RpcError::Transport(format!("Failed to get local addr: {}", e)))
    }

    /// Returns a handle that can stop the accept loop from another task.
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            state: self.state.clone(),
        }
    }

    /// Accepts and serves connections until stopped.
    ///
    /// Each accepted connection is served by its own spawned task. Failed
    /// accepts are logged and skipped. Connections over the configured
    /// limit are closed immediately. Returns once [`ServerHandle::stop`] is
    /// called; connections already in progress run to completion.
    pub async fn serve_all(&self) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!(
            "Serving {} function(s) on {}",
            self.registry.len(),
            addr
        );

        while self.state.running.load(Ordering::SeqCst) {
            let (stream, peer_addr) = tokio::select! {
                _ = self.state.shutdown.notified() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                },
            };

            let permit = match self.connections.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!(
                        "Connection limit ({}) reached; closing connection from {}",
                        self.config.max_connections,
                        peer_addr
                    );
                    continue;
                }
            };

            tracing::debug!("Connection established from {}", peer_addr);

            let registry = self.registry.clone();
            let io_timeout = self.config.io_timeout;
            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = handle_connection(stream, registry, io_timeout).await {
                    tracing::debug!("Connection from {} ended with error: {}", peer_addr, e);
                }
            });
        }

        tracing::info!("Server on {} stopped", addr);
        Ok(())
    }
}

/// Stops a running [`RpcServer`].
#[derive(Clone)]
pub struct ServerHandle {
    state: Arc<RunState>,
}

impl ServerHandle {
    /// Stops accepting connections. `serve_all` returns shortly after.
    pub fn stop(&self) {
        self.state.running.store(false, Ordering::SeqCst);
        self.state.shutdown.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }
}
