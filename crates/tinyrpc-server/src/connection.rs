use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use tinyrpc_common::transport::tcp::with_timeout;
use tinyrpc_common::transport::MessageCodec;
use tinyrpc_common::{Message, OpCode, Result, RpcError, RpcPayload};

use crate::registry::{FunctionRegistry, Handler};

/// Serves a single request on one connection.
///
/// Reads one request, resolves or invokes the named function, writes one
/// response and returns; the connection closes when `stream` is dropped.
///
/// # Failure Handling
///
/// - Unknown or response-only operation codes, transport errors and
///   timeouts close the connection without a response.
/// - Over-long names or payloads and non-UTF-8 names get an error response.
///   Lengths are rejected from the header, before the body is buffered.
/// - Unknown functions, handlers that return `None`, return an invalid
///   payload, or panic get an error response. The handler's output is never
///   written to the wire unless it passes [`RpcPayload::validate`].
///
/// # Arguments
///
/// * `stream` - The accepted connection (any async byte stream)
/// * `registry` - Functions available to this connection
/// * `io_timeout` - Deadline for reading the request and for writing the response
pub async fn handle_connection<S>(
    stream: S,
    registry: Arc<FunctionRegistry>,
    io_timeout: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, MessageCodec::request());

    let request = match with_timeout(io_timeout, async { framed.next().await.transpose() }).await {
        Ok(Some(request)) => request,
        Ok(None) => {
            tracing::debug!("Connection closed before a request arrived");
            return Ok(());
        }
        Err(e) if owes_response(&e) => {
            tracing::warn!("Rejecting malformed request: {}", e);
            send_response(&mut framed, Message::error(), io_timeout).await?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    tracing::debug!("Handling {} request for function: {}", request.op, request.name);
    let response = dispatch(&registry, request).await;
    send_response(&mut framed, response, io_timeout).await
}

/// Protocol violations detected after a well-formed header still get a reply.
fn owes_response(err: &RpcError) -> bool {
    matches!(
        err,
        RpcError::PayloadTooLarge { .. } | RpcError::NameTooLong { .. } | RpcError::MalformedMessage(_)
    )
}

async fn send_response<S>(
    framed: &mut Framed<S, MessageCodec>,
    response: Message,
    io_timeout: Option<Duration>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    with_timeout(io_timeout, framed.send(response)).await
}

async fn dispatch(registry: &FunctionRegistry, request: Message) -> Message {
    let Message { op, name, payload } = request;

    match op {
        OpCode::Find => match registry.lookup(&name) {
            Ok(_) => Message::success(name, None),
            Err(e) => {
                tracing::debug!("{}", e);
                Message::error()
            }
        },
        OpCode::Call => {
            let handler = match registry.lookup(&name) {
                Ok(handler) => handler,
                Err(e) => {
                    tracing::debug!("{}", e);
                    return Message::error();
                }
            };

            match invoke(handler, payload.unwrap_or_default()).await {
                Ok(result) => Message::success(name, Some(result)),
                Err(e) => {
                    tracing::warn!("Function '{}' failed: {}", name, e);
                    Message::error()
                }
            }
        }
        // The request codec never yields these
        OpCode::Success | OpCode::Error => Message::error(),
    }
}

/// Runs a handler on the blocking pool and checks what it returned.
async fn invoke(handler: Arc<dyn Handler>, payload: RpcPayload) -> Result<RpcPayload> {
    let result = tokio::task::spawn_blocking(move || handler.call(payload))
        .await
        .map_err(|e| RpcError::HandlerFailure(format!("handler panicked: {}", e)))?
        .ok_or_else(|| RpcError::HandlerFailure("handler returned no result".to_string()))?;

    result
        .validate()
        .map_err(|e| RpcError::HandlerFailure(format!("invalid result: {}", e)))?;

    Ok(result)
}
