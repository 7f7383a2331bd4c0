//! Streaming update events
//!
//! Streaming responses deliver a sequence of task events over SSE: status
//! updates as the task moves through its lifecycle, and artifact updates as
//! output is produced. The wire format carries no explicit discriminator;
//! the two event kinds are told apart by whether a `status` or `artifact`
//! field is present.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::task::{Artifact, TaskStatus};

/// Task status change event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusUpdateEvent {
    /// Id of the task the event belongs to
    pub id: String,

    pub status: TaskStatus,

    /// Set on the last event of a stream
    #[serde(rename = "final", default)]
    pub is_final: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl TaskStatusUpdateEvent {
    pub fn new(id: impl Into<String>, status: TaskStatus, is_final: bool) -> Self {
        Self {
            id: id.into(),
            status,
            is_final,
            metadata: None,
        }
    }
}

/// Artifact production event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskArtifactUpdateEvent {
    /// Id of the task the event belongs to
    pub id: String,

    pub artifact: Artifact,

    #[serde(rename = "final", default)]
    pub is_final: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl TaskArtifactUpdateEvent {
    pub fn new(id: impl Into<String>, artifact: Artifact) -> Self {
        Self {
            id: id.into(),
            artifact,
            is_final: false,
            metadata: None,
        }
    }
}

/// Either kind of streaming update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TaskEvent {
    Status(TaskStatusUpdateEvent),
    Artifact(TaskArtifactUpdateEvent),
}

impl TaskEvent {
    /// Id of the task the event belongs to
    pub fn task_id(&self) -> &str {
        match self {
            TaskEvent::Status(e) => &e.id,
            TaskEvent::Artifact(e) => &e.id,
        }
    }

    /// Whether this event terminates the stream
    pub fn is_final(&self) -> bool {
        match self {
            TaskEvent::Status(e) => e.is_final,
            TaskEvent::Artifact(e) => e.is_final,
        }
    }
}

impl From<TaskStatusUpdateEvent> for TaskEvent {
    fn from(event: TaskStatusUpdateEvent) -> Self {
        TaskEvent::Status(event)
    }
}

impl From<TaskArtifactUpdateEvent> for TaskEvent {
    fn from(event: TaskArtifactUpdateEvent) -> Self {
        TaskEvent::Artifact(event)
    }
}
