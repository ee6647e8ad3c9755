use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::error::{Result, RpcError};
use crate::protocol::message::{Message, OpCode, HEADER_LEN, INTEGER_LEN, MAX_NAME_LEN};
use crate::protocol::payload::{RpcPayload, MAX_PAYLOAD_LEN};

/// Which side of a connection the codec serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Decodes requests, encodes responses.
    Server,
    /// Encodes requests, decodes responses.
    Client { expect_payload: bool },
}

/// Codec for framing TinyRPC messages.
///
/// Decoding waits until every byte declared by the header has arrived, so
/// callers never observe a partially read field. Declared lengths are
/// checked against the protocol maximums before buffer space is reserved.
///
/// Whether a message carries a payload section is not encoded in the
/// header; it follows from the operation's canonical shape. Requests always
/// carry one. Responses carry one only for a successful `CALL`, which is why
/// the client codec is told what it is waiting for.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use tinyrpc_common::transport::MessageCodec;
/// use tinyrpc_common::{Message, RpcPayload};
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let mut client = MessageCodec::response(true);
/// let mut server = MessageCodec::request();
///
/// let mut wire = BytesMut::new();
/// client.encode(Message::call("double", RpcPayload::from_integer(21)), &mut wire).unwrap();
///
/// let request = server.decode(&mut wire).unwrap().unwrap();
/// assert_eq!(request.name, "double");
/// assert_eq!(request.payload.unwrap().integer(), 21);
/// ```
#[derive(Debug, Clone)]
pub struct MessageCodec {
    role: Role,
}

impl MessageCodec {
    /// Server-side codec: decodes `FIND`/`CALL` requests, encodes responses.
    pub fn request() -> Self {
        Self { role: Role::Server }
    }

    /// Client-side codec: encodes requests, decodes responses.
    ///
    /// `expect_payload` is true when waiting for a `CALL` response, whose
    /// `SUCCESS` form carries the result payload.
    pub fn response(expect_payload: bool) -> Self {
        Self {
            role: Role::Client { expect_payload },
        }
    }

    /// Encodes a message into `dst` without any role checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is too long or the payload fails
    /// [`RpcPayload::validate`]. Nothing is written in that case.
    pub fn encode_message(msg: &Message, dst: &mut BytesMut) -> Result<()> {
        let name = msg.name.as_bytes();
        if name.len() > MAX_NAME_LEN {
            return Err(RpcError::NameTooLong {
                size: name.len(),
                max: MAX_NAME_LEN,
            });
        }

        if let Some(payload) = &msg.payload {
            payload.validate()?;
        }

        let payload_len = msg.payload.as_ref().map_or(0, RpcPayload::bytes_len);
        let payload_section = msg.payload.as_ref().map_or(0, |_| INTEGER_LEN + payload_len);
        dst.reserve(HEADER_LEN + name.len() + payload_section);

        dst.put_i32(msg.op.as_i32());
        dst.put_u32(name.len() as u32);
        dst.put_u32(payload_len as u32);
        dst.put_slice(name);

        if let Some(payload) = &msg.payload {
            dst.put_i64(payload.integer());
            dst.put_slice(payload.data());
        }

        Ok(())
    }

    fn decodes(&self, op: OpCode) -> bool {
        match self.role {
            Role::Server => op.is_request(),
            Role::Client { .. } => !op.is_request(),
        }
    }

    fn carries_payload(&self, op: OpCode) -> bool {
        match self.role {
            Role::Server => true,
            Role::Client { expect_payload } => expect_payload && op == OpCode::Success,
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = RpcError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        // Peek at the header; nothing is consumed until the frame is complete
        let mut header = &src[..HEADER_LEN];
        let code = header.get_i32();
        let name_len = header.get_u32() as usize;
        let payload_len = header.get_u32() as usize;

        let op = OpCode::from_code(code)?;
        if !self.decodes(op) {
            return Err(RpcError::UnexpectedOperation(op));
        }

        if name_len > MAX_NAME_LEN {
            return Err(RpcError::NameTooLong {
                size: name_len,
                max: MAX_NAME_LEN,
            });
        }

        let has_payload = self.carries_payload(op);
        if has_payload && payload_len > MAX_PAYLOAD_LEN {
            return Err(RpcError::PayloadTooLarge {
                size: payload_len,
                max: MAX_PAYLOAD_LEN,
            });
        }

        let frame_len = HEADER_LEN
            + name_len
            + if has_payload { INTEGER_LEN + payload_len } else { 0 };
        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let name = String::from_utf8(src.split_to(name_len).to_vec())
            .map_err(|_| RpcError::MalformedMessage("function name is not valid UTF-8".to_string()))?;

        let payload = if has_payload {
            let integer = src.get_i64();
            let bytes = src.split_to(payload_len).freeze();
            Some(RpcPayload::new(integer, bytes))
        } else {
            None
        };

        Ok(Some(Message { op, name, payload }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(msg) => Ok(Some(msg)),
            None if src.is_empty() => Ok(None),
            None => Err(RpcError::Transport(format!(
                "connection closed inside a message ({} bytes buffered)",
                src.len()
            ))),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = RpcError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<()> {
        // A codec only sends what its peer's codec decodes
        if self.decodes(msg.op) {
            return Err(RpcError::UnexpectedOperation(msg.op));
        }
        Self::encode_message(&msg, dst)
    }
}
