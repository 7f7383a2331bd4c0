//! JSON-RPC + SSE protocol server
//!
//! Exposes a [`TaskManager`] over HTTP: the agent card at
//! `/.well-known/agent.json` and a single JSON-RPC endpoint at `/` that
//! carries every task method. Streaming methods answer with an SSE body
//! instead of a JSON one.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    codec::{
        jsonrpc::{JsonRpcRequest, JsonRpcResponse},
        sse,
    },
    manager::{EventStream, TaskManager},
    protocol::{
        agent::AgentCard,
        error::{A2AError, A2AResult},
        task::{TaskIdParams, TaskPushNotificationConfig, TaskQueryParams, TaskSendParams},
    },
};

#[derive(Clone)]
struct ServerState {
    manager: Arc<dyn TaskManager>,
    card: AgentCard,
}

/// HTTP server hosting one agent
pub struct A2AServer {
    manager: Arc<dyn TaskManager>,
    card: AgentCard,
}

impl A2AServer {
    /// Create a server for the given card and task manager
    pub fn new(card: AgentCard, manager: Arc<dyn TaskManager>) -> Self {
        Self { manager, card }
    }

    /// Build the axum router for this agent
    pub fn router(&self) -> Router {
        let state = ServerState {
            manager: self.manager.clone(),
            card: self.card.clone(),
        };
        Router::new()
            .route("/.well-known/agent.json", get(agent_card))
            .route("/", post(handle_rpc))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET, Method::POST])
                    .allow_headers(Any),
            )
            .with_state(state)
    }

    /// Bind and serve until the process is stopped
    pub async fn serve(self, addr: SocketAddr) -> A2AResult<()> {
        let router = self.router();
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| A2AError::Transport(e.to_string()))?;
        tracing::info!(%addr, agent = %self.card.name, "serving agent");
        axum::serve(listener, router)
            .await
            .map_err(|e| A2AError::Transport(e.to_string()))
    }
}

async fn agent_card(State(state): State<ServerState>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn handle_rpc(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Recover the request id when the payload is an object, so errors can
    // echo it
    let (request, id) = match serde_json::from_slice::<Value>(&body) {
        Err(e) => {
            return rpc_error(None, &A2AError::Parse(e.to_string()));
        }
        Ok(value) => {
            let id = value.get("id").cloned();
            match serde_json::from_value::<JsonRpcRequest>(value) {
                Err(_) => return rpc_error(id, &A2AError::InvalidRequest),
                Ok(request) => (request, id),
            }
        }
    };
    if !request.is_valid() {
        return rpc_error(id, &A2AError::InvalidRequest);
    }

    tracing::debug!(method = %request.method, "dispatching request");
    match request.method.as_str() {
        "tasks/sendSubscribe" | "tasks/resubscribe" => {
            handle_streaming(&state, &headers, request).await
        }
        _ => {
            let response = match dispatch(&state, &request).await {
                Ok(result) => JsonRpcResponse::success(request.id, result),
                Err(e) => {
                    tracing::warn!(method = %request.method, error = %e, "request failed");
                    JsonRpcResponse::from_error(request.id, &e)
                }
            };
            Json(response).into_response()
        }
    }
}

/// Dispatch a non-streaming method to the task manager
async fn dispatch(state: &ServerState, request: &JsonRpcRequest) -> A2AResult<Value> {
    let params = request.params.clone();
    match request.method.as_str() {
        "tasks/send" => {
            let params: TaskSendParams = parse_params(params)?;
            let task = state.manager.create_task(params).await?;
            Ok(serde_json::to_value(task)?)
        }
        "tasks/get" => {
            let params: TaskQueryParams = parse_params(params)?;
            let task = state
                .manager
                .get_task(&params.id, params.history_length)
                .await?;
            Ok(serde_json::to_value(task)?)
        }
        "tasks/cancel" => {
            let params: TaskIdParams = parse_params(params)?;
            let task = state.manager.cancel_task(&params.id).await?;
            Ok(serde_json::to_value(task)?)
        }
        "tasks/pushNotification/set" => {
            let params: TaskPushNotificationConfig = parse_params(params)?;
            let config = state.manager.set_push_notification(params).await?;
            Ok(serde_json::to_value(config)?)
        }
        "tasks/pushNotification/get" => {
            let params: TaskIdParams = parse_params(params)?;
            let config = state.manager.get_push_notification(&params.id).await?;
            Ok(serde_json::to_value(config)?)
        }
        method => Err(A2AError::MethodNotFound(method.to_string())),
    }
}

/// Open the event stream for a streaming method and pipe it out as SSE
async fn handle_streaming(
    state: &ServerState,
    headers: &HeaderMap,
    request: JsonRpcRequest,
) -> Response {
    if !accepts_event_stream(headers) {
        let err = A2AError::ContentTypeNotSupported(format!(
            "{} requires an Accept header allowing {}",
            request.method,
            sse::MIME_TYPE
        ));
        return rpc_error(request.id, &err);
    }

    let events: A2AResult<EventStream> = match request.method.as_str() {
        "tasks/sendSubscribe" => match parse_params::<TaskSendParams>(request.params.clone()) {
            Ok(params) => state.manager.send_subscribe(params).await,
            Err(e) => Err(e),
        },
        "tasks/resubscribe" => match parse_params::<TaskQueryParams>(request.params.clone()) {
            Ok(params) => {
                state
                    .manager
                    .resubscribe(&params.id, params.history_length)
                    .await
            }
            Err(e) => Err(e),
        },
        method => Err(A2AError::MethodNotFound(method.to_string())),
    };

    let events = match events {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(method = %request.method, error = %e, "streaming request failed");
            return rpc_error(request.id, &e);
        }
    };

    let frames = events.map(|event| {
        let frame = match sse::frame(&event) {
            Ok(frame) => frame,
            Err(e) => sse::error_frame(&e),
        };
        Ok::<Bytes, Infallible>(Bytes::from(frame))
    });

    (
        [(header::CONTENT_TYPE, sse::MIME_TYPE)],
        Body::from_stream(frames),
    )
        .into_response()
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> A2AResult<T> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| A2AError::InvalidParams(e.to_string()))
}

fn accepts_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains(sse::MIME_TYPE) || accept.contains("*/*"))
        .unwrap_or(false)
}

fn rpc_error(id: Option<Value>, err: &A2AError) -> Response {
    Json(JsonRpcResponse::from_error(id, err)).into_response()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        manager::InMemoryTaskManager,
        protocol::message::Message,
        protocol::task::{Task, TaskState, TaskStatus},
    };
    use async_trait::async_trait;

    struct DoneProcessor;

    #[async_trait]
    impl crate::manager::TaskProcessor for DoneProcessor {
        async fn process(&self, params: &TaskSendParams) -> A2AResult<Task> {
            Ok(Task::new(
                &params.id,
                TaskStatus::with_message(TaskState::Completed, Message::agent("done")),
            ))
        }
    }

    fn test_state() -> ServerState {
        let manager = InMemoryTaskManager::new(Arc::new(DoneProcessor));
        ServerState {
            manager: Arc::new(manager),
            card: AgentCard::new("test", "http://localhost", "0.1.0"),
        }
    }

    async fn post_rpc(state: ServerState, headers: HeaderMap, body: &str) -> Value {
        let response = handle_rpc(State(state), headers, Bytes::from(body.to_string())).await;
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_parse_error_on_malformed_json() {
        let body = post_rpc(test_state(), HeaderMap::new(), "{not json").await;
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_request_echoes_id() {
        let body = post_rpc(test_state(), HeaderMap::new(), r#"{"id": 7, "params": {}}"#).await;
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["id"], 7);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_rejected() {
        let body = post_rpc(
            test_state(),
            HeaderMap::new(),
            r#"{"jsonrpc": "1.0", "method": "tasks/get", "id": 1}"#,
        )
        .await;
        assert_eq!(body["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let body = post_rpc(
            test_state(),
            HeaderMap::new(),
            r#"{"jsonrpc": "2.0", "method": "tasks/unknown", "id": 1}"#,
        )
        .await;
        assert_eq!(body["error"]["code"], -32601);
        assert_eq!(body["id"], 1);
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let body = post_rpc(
            test_state(),
            HeaderMap::new(),
            r#"{"jsonrpc": "2.0", "method": "tasks/get", "params": {"wrong": true}, "id": 1}"#,
        )
        .await;
        assert_eq!(body["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_send_task_round_trip() {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tasks/send",
            "params": {
                "id": "task-1",
                "message": {"role": "user", "parts": [{"type": "text", "text": "hi"}]}
            },
            "id": "req-1"
        });
        let body = post_rpc(test_state(), HeaderMap::new(), &request.to_string()).await;
        assert_eq!(body["id"], "req-1");
        assert_eq!(body["result"]["status"]["state"], "completed");
    }

    #[tokio::test]
    async fn test_get_unknown_task_maps_to_not_found() {
        let body = post_rpc(
            test_state(),
            HeaderMap::new(),
            r#"{"jsonrpc": "2.0", "method": "tasks/get", "params": {"id": "missing"}, "id": 2}"#,
        )
        .await;
        assert_eq!(body["error"]["code"], -32001);
    }

    #[tokio::test]
    async fn test_streaming_requires_accept_header() {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tasks/sendSubscribe",
            "params": {
                "id": "task-1",
                "message": {"role": "user", "parts": [{"type": "text", "text": "hi"}]}
            },
            "id": 3
        });
        // JSON accept only
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());
        let body = post_rpc(test_state(), headers, &request.to_string()).await;
        assert_eq!(body["error"]["code"], -32005);
    }

    #[tokio::test]
    async fn test_streaming_response_is_sse() {
        let request = json!({
            "jsonrpc": "2.0",
            "method": "tasks/sendSubscribe",
            "params": {
                "id": "task-1",
                "message": {"role": "user", "parts": [{"type": "text", "text": "hi"}]}
            },
            "id": 4
        });
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, sse::MIME_TYPE.parse().unwrap());
        let response = handle_rpc(
            State(test_state()),
            headers,
            Bytes::from(request.to_string()),
        )
        .await;

        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            sse::MIME_TYPE
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("data: "));
        assert!(text.contains("\"submitted\""));
        assert!(text.contains("\"completed\""));
    }

    #[tokio::test]
    async fn test_accept_wildcard_allows_streaming() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "*/*".parse().unwrap());
        assert!(accepts_event_stream(&headers));

        assert!(!accepts_event_stream(&HeaderMap::new()));
    }
}
