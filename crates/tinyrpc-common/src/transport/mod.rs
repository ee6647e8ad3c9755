//! TinyRPC Transport Layer
//!
//! This module frames protocol messages on a byte stream and provides the
//! TCP helpers shared by the server and client.
//!
//! # Components
//!
//! - **[`MessageCodec`]**: `tokio_util` codec that reads whole messages or
//!   reports a clean error, never a short field
//! - **[`tcp`]**: connect with timeout, per-step deadlines, I/O error mapping
//!
//! # Message Size Limits
//!
//! Declared lengths are checked against [`MAX_PAYLOAD_LEN`](crate::MAX_PAYLOAD_LEN)
//! and [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) before any buffer space is
//! reserved for them.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::{SinkExt, StreamExt};
//! use tinyrpc_common::transport::{tcp, MessageCodec};
//! use tinyrpc_common::Message;
//! use tokio_util::codec::Framed;
//!
//! # async fn run() -> tinyrpc_common::Result<()> {
//! let stream = tcp::connect("127.0.0.1:3000".parse()?, None).await?;
//! let mut framed = Framed::new(stream, MessageCodec::response(false));
//! framed.send(Message::find("double")).await?;
//! let response = framed.next().await;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod tcp;

pub use codec::MessageCodec;
