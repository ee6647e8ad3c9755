//! TinyRPC Payload Type
//!
//! This module defines the opaque value passed into and returned from a
//! remote function.

use bytes::Bytes;

use super::error::{Result, RpcError};

/// Maximum length of a payload's byte field (100,000 bytes).
///
/// Bounds the memory allocated per message. Both peers enforce it before
/// allocating or sending.
pub const MAX_PAYLOAD_LEN: usize = 100_000;

/// An RPC payload: a 64-bit integer plus an optional byte field.
///
/// The byte field and its declared length are stored separately, mirroring
/// the wire format. A payload is consistent when the byte field is absent
/// exactly when `bytes_len` is zero and otherwise holds `bytes_len` bytes.
/// Use [`RpcPayload::validate`] before trusting a payload that came from
/// user code.
///
/// # Example
///
/// ```
/// use tinyrpc_common::RpcPayload;
///
/// let payload = RpcPayload::new(42, b"hello".to_vec());
/// assert_eq!(payload.integer(), 42);
/// assert_eq!(payload.bytes_len(), 5);
/// assert!(payload.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RpcPayload {
    integer: i64,
    bytes: Option<Bytes>,
    bytes_len: usize,
}

impl RpcPayload {
    /// Creates a consistent payload. An empty byte field is stored as absent.
    pub fn new(integer: i64, bytes: impl Into<Bytes>) -> Self {
        let bytes: Bytes = bytes.into();
        let bytes_len = bytes.len();
        RpcPayload {
            integer,
            bytes: (bytes_len > 0).then_some(bytes),
            bytes_len,
        }
    }

    /// Creates a payload carrying only an integer.
    pub fn from_integer(integer: i64) -> Self {
        RpcPayload {
            integer,
            bytes: None,
            bytes_len: 0,
        }
    }

    /// Creates a payload from raw parts without checking them.
    ///
    /// This can express an inconsistent byte field / length pairing, which
    /// [`RpcPayload::validate`] rejects.
    pub fn from_parts(integer: i64, bytes: Option<Bytes>, bytes_len: usize) -> Self {
        RpcPayload {
            integer,
            bytes,
            bytes_len,
        }
    }

    pub fn integer(&self) -> i64 {
        self.integer
    }

    /// The declared length of the byte field.
    pub fn bytes_len(&self) -> usize {
        self.bytes_len
    }

    /// The byte field, if present.
    pub fn bytes(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }

    /// The byte field as a slice; empty when absent.
    pub fn data(&self) -> &[u8] {
        self.bytes.as_deref().unwrap_or_default()
    }

    /// Checks the payload against the protocol's data-integrity rules.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if `bytes_len` exceeds [`MAX_PAYLOAD_LEN`]
    /// - `MalformedPayload` if the byte field does not hold exactly
    ///   `bytes_len` bytes (an absent field counts as zero bytes)
    pub fn validate(&self) -> Result<()> {
        if self.bytes_len > MAX_PAYLOAD_LEN {
            return Err(RpcError::PayloadTooLarge {
                size: self.bytes_len,
                max: MAX_PAYLOAD_LEN,
            });
        }

        let actual = self.bytes.as_ref().map_or(0, Bytes::len);
        if actual != self.bytes_len {
            return Err(RpcError::MalformedPayload(match &self.bytes {
                None => format!("byte field is absent but length is {}", self.bytes_len),
                Some(_) => format!(
                    "byte field holds {} bytes but length is {}",
                    actual, self.bytes_len
                ),
            }));
        }

        Ok(())
    }
}

impl PartialEq for RpcPayload {
    fn eq(&self, other: &Self) -> bool {
        self.integer == other.integer
            && self.bytes_len == other.bytes_len
            && self.data() == other.data()
    }
}

impl Eq for RpcPayload {}
