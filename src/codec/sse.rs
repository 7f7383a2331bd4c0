//! Server-sent event framing
//!
//! Streaming responses are delivered as SSE frames, each carrying one
//! JSON-serialized payload in its `data` field. Mid-stream failures are
//! reported in-band as a JSON-RPC shaped frame with an `error` member, since
//! the HTTP status line has already been sent by the time they occur.

use std::time::Duration;

use async_stream::stream;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use super::jsonrpc::{JsonRpcError, JsonRpcResponse};
use crate::protocol::{
    error::{A2AError, A2AResult},
    event::TaskEvent,
};

/// Content type of an SSE response body
pub const MIME_TYPE: &str = "text/event-stream";

/// Encode a payload as a single SSE data frame
pub fn frame<T: Serialize>(payload: &T) -> A2AResult<String> {
    let json = serde_json::to_string(payload)?;
    Ok(format!("data: {json}\n\n"))
}

/// Encode an error as an in-band SSE frame
///
/// The payload is a JSON-RPC response with a null id, so clients can reuse
/// their error handling for both transports.
pub fn error_frame(err: &A2AError) -> String {
    let response = JsonRpcResponse::error(None, JsonRpcError::from(err));
    let json = serde_json::to_value(&response)
        .unwrap_or_else(|_| Value::Null)
        .to_string();
    format!("data: {json}\n\n")
}

/// Decode an SSE byte stream into task events
///
/// Frames that fail to parse are logged and skipped. An in-band error frame
/// yields an [`A2AError::Rpc`] and ends the stream. The stream also ends on
/// a final event, on upstream close, or after `idle_timeout` without a frame
/// (without error, matching server-side subscriber expiry).
pub fn decode_stream<S, B, E>(
    byte_stream: S,
    idle_timeout: Duration,
) -> impl Stream<Item = A2AResult<TaskEvent>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::error::Error + Send + 'static,
{
    stream! {
        let events = byte_stream.eventsource();
        futures::pin_mut!(events);

        loop {
            let next = tokio::time::timeout(idle_timeout, events.next()).await;
            let event = match next {
                // Idle expiry ends the stream quietly
                Err(_) => break,
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    yield Err(A2AError::Transport(e.to_string()));
                    break;
                }
                Ok(Some(Ok(event))) => event,
            };

            let value: Value = match serde_json::from_str(&event.data) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unparseable SSE frame");
                    continue;
                }
            };

            if let Some(error) = value.get("error") {
                let code = error
                    .get("code")
                    .and_then(Value::as_i64)
                    .unwrap_or(crate::protocol::error::code::INTERNAL_ERROR);
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                yield Err(A2AError::Rpc { code, message });
                break;
            }

            match serde_json::from_value::<TaskEvent>(value) {
                Ok(event) => {
                    let done = event.is_final();
                    yield Ok(event);
                    if done {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping frame that is not a task event");
                    continue;
                }
            }
        }
    }
}
