//! JSON-RPC + SSE client for one remote agent

use std::time::Duration;

use futures::Stream;
use reqwest::header;
use serde_json::Value;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::resolver::CardResolver;
use crate::{
    codec::{
        jsonrpc::{JsonRpcRequest, JsonRpcResponse},
        sse,
    },
    protocol::{
        agent::AgentCard,
        error::{A2AError, A2AResult},
        event::TaskEvent,
        message::Message,
        task::{Task, TaskPushNotificationConfig, TaskSendParams},
    },
};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Per-request timeout for non-streaming calls
    pub timeout: Duration,

    /// Bearer token attached to every request when set
    pub bearer_token: Option<String>,

    /// Idle period after which a streaming response is considered over
    pub idle_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            bearer_token: None,
            idle_timeout: Duration::from_secs(300),
        }
    }
}

impl ClientConfig {
    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the bearer token
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set the streaming idle timeout
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

/// Client for one remote agent
///
/// Owns a persistent HTTP connection pool and a card resolver for its whole
/// lifetime; both are released on drop. The remote's card is fetched lazily
/// on first use and cached.
pub struct A2AClient {
    base_url: String,
    config: ClientConfig,
    http: reqwest::Client,
    resolver: CardResolver,
    card: OnceCell<AgentCard>,
}

impl A2AClient {
    /// Create a client with default configuration
    pub fn new(base_url: impl Into<String>) -> A2AResult<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Create a client with the given configuration
    ///
    /// No whole-request timeout is set on the underlying HTTP client, since
    /// it would also cap streaming responses; non-streaming calls apply
    /// [`ClientConfig::timeout`] per request instead.
    pub fn with_config(base_url: impl Into<String>, config: ClientConfig) -> A2AResult<Self> {
        let http = reqwest::Client::builder().build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            resolver: CardResolver::with_client(http.clone()),
            base_url,
            config,
            http,
            card: OnceCell::new(),
        })
    }

    /// Base URL of the remote agent
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate a fresh task id
    pub fn new_task_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// The remote's agent card, fetched on first call and cached
    pub async fn agent_card(&self) -> A2AResult<&AgentCard> {
        self.card
            .get_or_try_init(|| self.resolver.resolve(&self.base_url))
            .await
    }

    /// Submit a task and wait for the server's (possibly non-terminal) view
    pub async fn send_task(&self, params: TaskSendParams) -> A2AResult<Task> {
        let result = self
            .rpc("tasks/send", serde_json::to_value(&params)?)
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Convenience wrapper submitting a plain user message under a fresh
    /// task id
    pub async fn send_text(
        &self,
        text: impl Into<String>,
        session_id: Option<String>,
    ) -> A2AResult<Task> {
        let mut params = TaskSendParams::new(Self::new_task_id(), Message::user(text));
        params.session_id = session_id;
        self.send_task(params).await
    }

    /// Fetch a task by id
    pub async fn get_task(&self, id: &str, history_length: Option<usize>) -> A2AResult<Task> {
        let mut params = serde_json::json!({ "id": id });
        if let Some(n) = history_length {
            params["historyLength"] = n.into();
        }
        let result = self.rpc("tasks/get", params).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Cancel a task
    pub async fn cancel_task(&self, id: &str) -> A2AResult<Task> {
        let result = self.rpc("tasks/cancel", serde_json::json!({ "id": id })).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Store a push notification config for a task
    pub async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig> {
        let result = self
            .rpc("tasks/pushNotification/set", serde_json::to_value(&config)?)
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Fetch the push notification config for a task
    pub async fn get_push_notification(
        &self,
        id: &str,
    ) -> A2AResult<TaskPushNotificationConfig> {
        let result = self
            .rpc("tasks/pushNotification/get", serde_json::json!({ "id": id }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Submit a task and stream its lifecycle events
    ///
    /// Fails fast with [`A2AError::StreamingNotSupported`] when the remote's
    /// card does not advertise streaming, without a network round trip.
    pub async fn send_subscribe(
        &self,
        params: TaskSendParams,
    ) -> A2AResult<impl Stream<Item = A2AResult<TaskEvent>>> {
        self.stream_rpc("tasks/sendSubscribe", serde_json::to_value(&params)?)
            .await
    }

    /// Resume observing an existing task after a dropped connection
    pub async fn resubscribe(
        &self,
        id: &str,
        history_length: Option<usize>,
    ) -> A2AResult<impl Stream<Item = A2AResult<TaskEvent>>> {
        let mut params = serde_json::json!({ "id": id });
        if let Some(n) = history_length {
            params["historyLength"] = n.into();
        }
        self.stream_rpc("tasks/resubscribe", params).await
    }

    async fn rpc(&self, method: &str, params: Value) -> A2AResult<Value> {
        let request = JsonRpcRequest::new(method, params);
        let mut builder = self
            .http
            .post(&self.base_url)
            .json(&request)
            .timeout(self.config.timeout);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response: JsonRpcResponse = builder.send().await?.json().await?;
        if let Some(error) = response.error {
            return Err(A2AError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| A2AError::Upstream("response carried neither result nor error".into()))
    }

    async fn stream_rpc(
        &self,
        method: &str,
        params: Value,
    ) -> A2AResult<impl Stream<Item = A2AResult<TaskEvent>>> {
        let card = self.agent_card().await?;
        if !card.capabilities.streaming {
            return Err(A2AError::StreamingNotSupported);
        }

        let request = JsonRpcRequest::new(method, params);
        let mut builder = self
            .http
            .post(&self.base_url)
            .json(&request)
            .header(header::ACCEPT, sse::MIME_TYPE);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        // A rejected streaming request comes back as a JSON body instead of
        // an event stream
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with(sse::MIME_TYPE) {
            let rpc_response: JsonRpcResponse = response.json().await?;
            if let Some(error) = rpc_response.error {
                return Err(A2AError::Rpc {
                    code: error.code,
                    message: error.message,
                });
            }
            return Err(A2AError::Upstream(format!(
                "expected an event stream, got {content_type}"
            )));
        }

        Ok(sse::decode_stream(
            response.bytes_stream(),
            self.config.idle_timeout,
        ))
    }
}
