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

//! TinyRPC Server
//!
//! This crate provides the server side of TinyRPC: a registry of named
//! functions and a TCP server that resolves (`FIND`) and invokes (`CALL`)
//! them for remote clients.
//!
//! # Connection Model
//!
//! Each accepted connection is handled by its own detached task that reads
//! one request, writes one response and closes the connection. Registered
//! functions run on tokio's blocking pool.
//!
//! # Example
//!
//! ```no_run
//! use tinyrpc_common::RpcPayload;
//! use tinyrpc_server::RpcServer;
//!
//! # async fn run() -> tinyrpc_common::Result<()> {
//! let server = RpcServer::init(3000).await?;
//! server.register("double", |payload: RpcPayload| {
//!     Some(RpcPayload::from_integer(payload.integer() * 2))
//! })?;
//! server.serve_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod registry;
pub mod server;

pub use config::ServerConfig;
pub use connection::handle_connection;
pub use registry::{FunctionRegistry, Handler};
pub use server::{RpcServer, ServerHandle};
