//! Server configuration.
//!
//! Limits that keep a misbehaving or slow peer from holding server
//! resources indefinitely.

use std::time::Duration;

use tokio::sync::Semaphore;

use tinyrpc_common::transport::tcp::DEFAULT_TIMEOUT;

/// Default cap on concurrently served connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Server limits.
///
/// # Fields
///
/// - `io_timeout` - Deadline for reading the request and for writing the
///   response on each connection (default: 30 seconds, `None` disables it)
/// - `max_connections` - Connections served at once; further connections
///   are closed as soon as they are accepted (default: 1024)
///
/// The time a registered function spends running is not bounded.
///
/// # Example
///
/// ```
/// use tinyrpc_server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new()
///     .with_io_timeout(Some(Duration::from_secs(5)))
///     .with_max_connections(64);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub io_timeout: Option<Duration>,
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            io_timeout: Some(DEFAULT_TIMEOUT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-connection read/write deadline.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the maximum number of concurrently served connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The I/O timeout is zero
    /// - The I/O timeout is longer than one hour
    /// - `max_connections` is zero or above [`Semaphore::MAX_PERMITS`]
    pub fn validate(&self) -> Result<(), String> {
        if let Some(timeout) = self.io_timeout {
            if timeout.is_zero() {
                return Err("io timeout must be greater than zero".to_string());
            }
            if timeout.as_secs() > 3600 {
                return Err(format!(
                    "io timeout must be <= 1 hour (got {} seconds)",
                    timeout.as_secs()
                ));
            }
        }

        if self.max_connections == 0 {
            return Err("max connections must be greater than zero".to_string());
        }
        if self.max_connections > Semaphore::MAX_PERMITS {
            return Err(format!(
                "max connections must be <= {} (got {})",
                Semaphore::MAX_PERMITS,
                self.max_connections
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.io_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ServerConfig::new()
            .with_io_timeout(None)
            .with_max_connections(8);
        assert!(config.io_timeout.is_none());
        assert_eq!(config.max_connections, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let config = ServerConfig::new().with_io_timeout(Some(Duration::ZERO));
        assert!(config.validate().unwrap_err().contains("greater than zero"));
    }

    #[test]
    fn test_excessive_timeout_invalid() {
        let config = ServerConfig::new().with_io_timeout(Some(Duration::from_secs(3601)));
        assert!(config.validate().unwrap_err().contains("1 hour"));
    }

    #[test]
    fn test_zero_connections_invalid() {
        let config = ServerConfig::new().with_max_connections(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_limit_upper_bound() {
        let config = ServerConfig::new().with_max_connections(Semaphore::MAX_PERMITS);
        assert!(config.validate().is_ok());

        let config = ServerConfig::new().with_max_connections(usize::MAX);
        assert!(config.validate().unwrap_err().contains("max connections"));
    }
}
