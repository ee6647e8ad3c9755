//! TinyRPC Message Types
//!
//! A [`Message`] is the unit exchanged on a connection: an operation code, a
//! function name and an optional payload.

use std::fmt;

use super::error::{Result, RpcError};
use super::payload::RpcPayload;

/// Fixed header size: operation code, name length and payload length.
pub const HEADER_LEN: usize = 12;

/// Size of the payload's integer field on the wire.
pub const INTEGER_LEN: usize = 8;

/// Maximum accepted function name length.
pub const MAX_NAME_LEN: usize = 64 * 1024;

/// Operation code carried in the first header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OpCode {
    Error = 0,
    Success = 1,
    Find = 2,
    Call = 3,
}

impl OpCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Parses a wire operation code.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(OpCode::Error),
            1 => Ok(OpCode::Success),
            2 => Ok(OpCode::Find),
            3 => Ok(OpCode::Call),
            other => Err(RpcError::UnknownOperation(other)),
        }
    }

    /// Returns true for operations a client sends to a server.
    pub fn is_request(self) -> bool {
        matches!(self, OpCode::Find | OpCode::Call)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpCode::Error => "ERROR",
            OpCode::Success => "SUCCESS",
            OpCode::Find => "FIND",
            OpCode::Call => "CALL",
        };
        f.write_str(name)
    }
}

/// One framed message.
///
/// # Canonical Exchanges
///
/// ```text
/// FIND {name, {0, empty}}  ->  SUCCESS {name, no payload} | ERROR {"", no payload}
/// CALL {name, P}           ->  SUCCESS {name, result}     | ERROR {"", no payload}
/// ```
///
/// # Example
///
/// ```
/// use tinyrpc_common::{Message, OpCode, RpcPayload};
///
/// let find = Message::find("double");
/// assert_eq!(find.op, OpCode::Find);
/// assert_eq!(find.payload, Some(RpcPayload::default()));
///
/// let error = Message::error();
/// assert!(error.name.is_empty());
/// assert!(error.payload.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub op: OpCode,
    pub name: String,
    pub payload: Option<RpcPayload>,
}

impl Message {
    /// A FIND request. It carries an empty payload so both request kinds
    /// share one shape.
    pub fn find(name: impl Into<String>) -> Self {
        Message {
            op: OpCode::Find,
            name: name.into(),
            payload: Some(RpcPayload::default()),
        }
    }

    pub fn call(name: impl Into<String>, payload: RpcPayload) -> Self {
        Message {
            op: OpCode::Call,
            name: name.into(),
            payload: Some(payload),
        }
    }

    /// A SUCCESS response; `payload` is `None` for FIND responses.
    pub fn success(name: impl Into<String>, payload: Option<RpcPayload>) -> Self {
        Message {
            op: OpCode::Success,
            name: name.into(),
            payload,
        }
    }

    /// The ERROR response: empty name, no payload.
    pub fn error() -> Self {
        Message {
            op: OpCode::Error,
            name: String::new(),
            payload: None,
        }
    }
}
