// Copyright 2026 TinyRPC Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! TinyRPC Common Types and Transport
//!
//! This crate provides the wire protocol definitions and the framed TCP
//! transport shared by the TinyRPC server and client.
//!
//! # Overview
//!
//! TinyRPC is a minimal RPC system: a server registers named functions and a
//! client locates a function by name (`FIND`) and then invokes it (`CALL`).
//! Every exchange uses a fresh TCP connection carrying exactly one request
//! and one response.
//!
//! - **Protocol Layer**: payloads, operation codes, messages and errors
//! - **Transport Layer**: a `tokio_util` codec and TCP helpers
//!
//! # Wire Format
//!
//! All integers are big-endian:
//!
//! ```text
//! Header:  i32 operation | u32 name length | u32 payload byte length
//! Name:    [name length] bytes, no terminator
//! Payload: i64 integer | [payload byte length] bytes   (only when present)
//! ```
//!
//! # Example
//!
//! ```
//! use tinyrpc_common::{Message, RpcPayload};
//!
//! let request = Message::call("double", RpcPayload::from_integer(21));
//! assert_eq!(request.name, "double");
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
