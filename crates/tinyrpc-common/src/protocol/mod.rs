pub mod error;
pub mod message;
pub mod payload;


pub use error::{Result, RpcError};
pub use message::{Message, OpCode, HEADER_LEN, INTEGER_LEN, MAX_NAME_LEN};
pub use payload::{RpcPayload, MAX_PAYLOAD_LEN};
