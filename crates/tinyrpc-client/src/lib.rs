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

//! TinyRPC Client
//!
//! Locates remote functions by name and invokes them. Every operation opens
//! its own TCP connection, so one client can be shared by many concurrent
//! tasks and stays usable after any failed operation.

pub mod client;

pub use client::{RemoteHandle, RpcClient};
