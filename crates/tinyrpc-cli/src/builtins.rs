//! Built-in demo functions served by `tinyrpc serve`.

use bytes::Bytes;
use tinyrpc_common::{Result, RpcPayload};
use tinyrpc_server::FunctionRegistry;

/// Names of the built-in functions, in registration order.
pub const BUILTIN_NAMES: [&str; 5] = ["double", "add2", "echo", "reverse", "length"];

/// Registers every built-in function.
pub fn register_builtins(registry: &FunctionRegistry) -> Result<()> {
    registry.register("double", double)?;
    registry.register("add2", add2)?;
    registry.register("echo", echo)?;
    registry.register("reverse", reverse)?;
    registry.register("length", length)?;
    Ok(())
}

/// Doubles the integer field; `None` on overflow.
pub fn double(payload: RpcPayload) -> Option<RpcPayload> {
    payload.integer().checked_mul(2).map(RpcPayload::from_integer)
}

/// Adds two to the integer field; `None` on overflow.
pub fn add2(payload: RpcPayload) -> Option<RpcPayload> {
    payload.integer().checked_add(2).map(RpcPayload::from_integer)
}

pub fn echo(payload: RpcPayload) -> Option<RpcPayload> {
    Some(payload)
}

/// Reverses the byte field and keeps the integer.
pub fn reverse(payload: RpcPayload) -> Option<RpcPayload> {
    let mut data = payload.data().to_vec();
    data.reverse();
    Some(RpcPayload::new(payload.integer(), Bytes::from(data)))
}

/// Returns the byte field's length as the integer.
pub fn length(payload: RpcPayload) -> Option<RpcPayload> {
    i64::try_from(payload.bytes_len()).ok().map(RpcPayload::from_integer)
}
