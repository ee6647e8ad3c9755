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

//! # TinyRPC CLI
//!
//! Command-line interface for TinyRPC.
//!
//! - `tinyrpc serve`: start a server exposing the built-in functions
//! - `tinyrpc find`: resolve a function on a server
//! - `tinyrpc call`: resolve and invoke a function, printing the result as JSON
//!
//! The CLI uses the `argh` crate for argument parsing and dispatches to
//! `tinyrpc-server` and `tinyrpc-client`.

pub mod builtins;

use serde::Serialize;
use tinyrpc_common::RpcPayload;

/// JSON shape printed by `tinyrpc call`.
///
/// The byte field is rendered as (lossy) UTF-8 text.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CallOutput {
    pub integer: i64,
    pub bytes_len: usize,
    pub data: String,
}

impl From<&RpcPayload> for CallOutput {
    fn from(payload: &RpcPayload) -> Self {
        Self {
            integer: payload.integer(),
            bytes_len: payload.bytes_len(),
            data: String::from_utf8_lossy(payload.data()).into_owned(),
        }
    }
}
