use thiserror::Error;

use super::message::OpCode;

/// Errors produced by the protocol, transport, server and client layers.
///
/// Variants fall into the categories used throughout the crate:
///
/// - **Invalid argument**: `InvalidArgument`
/// - **Protocol violation**: `PayloadTooLarge`, `NameTooLong`, `MalformedPayload`,
///   `MalformedMessage`, `UnknownOperation`, `UnexpectedOperation`
/// - **Not found**: `NotFound`
/// - **Transport**: `Transport`, `Timeout`, `Io`
/// - **Handler failure**: `HandlerFailure`
/// - **Startup**: `Bind`
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Function not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {size} bytes (max {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Function name too long: {size} bytes (max {max} bytes)")]
    NameTooLong { size: usize, max: usize },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Unknown operation code: {0}")]
    UnknownOperation(i32),

    #[error("Unexpected operation: {0}")]
    UnexpectedOperation(OpCode),

    #[error("Handler failed: {0}")]
    HandlerFailure(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RpcError {
    /// Returns true if the peer (or a local caller) broke the wire contract.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            RpcError::PayloadTooLarge { .. }
                | RpcError::NameTooLong { .. }
                | RpcError::MalformedPayload(_)
                | RpcError::MalformedMessage(_)
                | RpcError::UnknownOperation(_)
                | RpcError::UnexpectedOperation(_)
        )
    }

    /// Returns true for connection-level failures, including timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RpcError::Transport(_) | RpcError::Timeout(_) | RpcError::Io(_)
        )
    }
}

impl From<std::net::AddrParseError> for RpcError {
    fn from(err: std::net::AddrParseError) -> Self {
        RpcError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
