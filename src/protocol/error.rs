//! Error types for A2A operations

use thiserror::Error;

/// JSON-RPC error codes used on the wire
pub mod code {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const TASK_NOT_FOUND: i64 = -32001;
    pub const TASK_NOT_CANCELABLE: i64 = -32002;
    pub const PUSH_NOT_SUPPORTED: i64 = -32003;
    pub const STREAMING_NOT_SUPPORTED: i64 = -32004;
    pub const CONTENT_TYPE_NOT_SUPPORTED: i64 = -32005;
}

/// Errors that can occur during A2A operations
#[derive(Debug, Error)]
pub enum A2AError {
    /// Referenced task does not exist
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task is in a terminal state and cannot be canceled
    #[error("Task cannot be canceled: {0}")]
    TaskNotCancelable(String),

    /// Requested mutation conflicts with the task's current lifecycle state
    #[error("State conflict: {0}")]
    StateConflict(String),

    /// Agent does not support push notifications
    #[error("Push Notification is not supported")]
    PushNotSupported,

    /// Agent does not support streaming
    #[error("Streaming is not supported")]
    StreamingNotSupported,

    /// Unsupported content type negotiation
    #[error("Incompatible content types: {0}")]
    ContentTypeNotSupported(String),

    /// Request parameters failed validation
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Unknown JSON-RPC method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Malformed JSON-RPC envelope
    #[error("Request payload validation error")]
    InvalidRequest,

    /// Payload was not valid JSON
    #[error("Invalid JSON payload: {0}")]
    Parse(String),

    /// Unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Network or HTTP-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Agent card could not be fetched or decoded
    #[error("Failed to resolve agent card from {url}: {reason}")]
    Resolution { url: String, reason: String },

    /// Error response received from a remote agent
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Remote agent misbehaved mid-stream
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl A2AError {
    /// JSON-RPC error code for this error
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            A2AError::TaskNotFound(_) => code::TASK_NOT_FOUND,
            A2AError::TaskNotCancelable(_) => code::TASK_NOT_CANCELABLE,
            A2AError::StateConflict(_) => code::INTERNAL_ERROR,
            A2AError::PushNotSupported => code::PUSH_NOT_SUPPORTED,
            A2AError::StreamingNotSupported => code::STREAMING_NOT_SUPPORTED,
            A2AError::ContentTypeNotSupported(_) => code::CONTENT_TYPE_NOT_SUPPORTED,
            A2AError::InvalidParams(_) => code::INVALID_PARAMS,
            A2AError::MethodNotFound(_) => code::METHOD_NOT_FOUND,
            A2AError::InvalidRequest => code::INVALID_REQUEST,
            A2AError::Parse(_) => code::PARSE_ERROR,
            A2AError::Rpc { code, .. } => *code,
            _ => code::INTERNAL_ERROR,
        }
    }
}

impl From<serde_json::Error> for A2AError {
    fn from(err: serde_json::Error) -> Self {
        A2AError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for A2AError {
    fn from(err: reqwest::Error) -> Self {
        A2AError::Transport(err.to_string())
    }
}

/// Result type for A2A operations
pub type A2AResult<T> = Result<T, A2AError>;
