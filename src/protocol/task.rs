//! A2A task types and lifecycle management

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    error::{A2AError, A2AResult},
    message::{Message, Part},
};

/// Task lifecycle state
///
/// Tasks move through a strict state machine:
///
/// ```text
/// SUBMITTED -> WORKING -> {COMPLETED | FAILED | CANCELED}
/// WORKING -> INPUT_REQUIRED -> WORKING
/// any non-terminal -> CANCELED (via cancel request only)
/// ```
///
/// Completed, failed and canceled are terminal: no further transitions or
/// artifact mutations are permitted once reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    Completed,
    Canceled,
    Failed,
}

impl TaskState {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed
        )
    }

    /// Check whether the lifecycle graph permits a transition to `next`
    ///
    /// Same-state transitions are treated as no-ops and allowed.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        if *self == next {
            return true;
        }
        match self {
            TaskState::Submitted => matches!(next, TaskState::Working | TaskState::Canceled),
            TaskState::Working => matches!(
                next,
                TaskState::InputRequired
                    | TaskState::Completed
                    | TaskState::Failed
                    | TaskState::Canceled
            ),
            TaskState::InputRequired => matches!(next, TaskState::Working | TaskState::Canceled),
            TaskState::Completed | TaskState::Canceled | TaskState::Failed => false,
        }
    }
}

/// Status of a task at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    pub state: TaskState,

    /// Optional message accompanying the status (e.g. the agent's response)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,

    /// When this status was entered
    pub timestamp: DateTime<Utc>,
}

impl TaskStatus {
    /// Create a status with the current timestamp and no message
    pub fn new(state: TaskState) -> Self {
        Self {
            state,
            message: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a status carrying a message
    pub fn with_message(state: TaskState, message: Message) -> Self {
        Self {
            state,
            message: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// A chunk of task output
///
/// Artifacts are keyed by `index` within a task. A later update with the same
/// index replaces the existing artifact, unless `append` is set in which case
/// its parts are concatenated onto the existing artifact's part list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parts: Vec<Part>,

    #[serde(default)]
    pub index: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,

    #[serde(rename = "lastChunk", skip_serializing_if = "Option::is_none")]
    pub last_chunk: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Artifact {
    /// Create an artifact at index 0 with the given parts
    pub fn new(name: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
            parts,
            index: 0,
            append: None,
            last_chunk: None,
            metadata: None,
        }
    }

    /// Set the artifact index
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = index;
        self
    }

    /// Mark this update as appending to the artifact at the same index
    pub fn appending(mut self) -> Self {
        self.append = Some(true);
        self
    }

    /// Concatenate the text of all text parts
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A unit of asynchronous work tracked by an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Opaque task identifier, unique per task manager
    pub id: String,

    /// Optional session id grouping related tasks
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Ordered task outputs, keyed by artifact index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,

    /// Optional message history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<Message>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

impl Task {
    /// Create a task in the submitted state
    pub fn new(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            session_id: None,
            status,
            artifacts: None,
            history: None,
            metadata: None,
        }
    }

    /// Set the session id
    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Set the task metadata
    pub fn with_metadata(mut self, metadata: Option<HashMap<String, Value>>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace the artifact list
    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Check if the task is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.state.is_terminal()
    }

    /// Apply a status transition, enforcing the lifecycle graph
    pub fn transition_to(&mut self, status: TaskStatus) -> A2AResult<()> {
        if !self.status.state.can_transition_to(status.state) {
            return Err(A2AError::StateConflict(format!(
                "task {} cannot move from {:?} to {:?}",
                self.id, self.status.state, status.state
            )));
        }
        self.status = status;
        Ok(())
    }

    /// Merge an artifact update into the task, keyed by index
    ///
    /// Replaces the artifact at the same index, or concatenates parts when the
    /// update carries `append = true`. An index never occurs twice.
    pub fn merge_artifact(&mut self, artifact: Artifact) {
        let artifacts = self.artifacts.get_or_insert_with(Vec::new);
        if let Some(existing) = artifacts.iter_mut().find(|a| a.index == artifact.index) {
            if artifact.append.unwrap_or(false) {
                existing.parts.extend(artifact.parts);
                existing.last_chunk = artifact.last_chunk;
            } else {
                *existing = artifact;
            }
        } else {
            artifacts.push(artifact);
        }
    }

    /// Truncate the message history to the most recent `n` entries
    ///
    /// `Some(0)` drops the history entirely; `None` keeps it in full.
    pub fn truncate_history(&mut self, history_length: Option<usize>) {
        match history_length {
            Some(0) => self.history = None,
            Some(n) => {
                if let Some(history) = &mut self.history {
                    if history.len() > n {
                        *history = history.split_off(history.len() - n);
                    }
                }
            }
            None => {}
        }
    }
}

/// Webhook descriptor for push notifications, at most one per task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushNotificationConfig {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Value>,
}

/// Push notification config paired with its task id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskPushNotificationConfig {
    pub id: String,

    #[serde(rename = "pushNotification")]
    pub push_notification: PushNotificationConfig,
}

/// Parameters identifying a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIdParams {
    pub id: String,
}

/// Parameters for querying a task, with optional history truncation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskQueryParams {
    pub id: String,

    #[serde(rename = "historyLength", skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,
}

/// Parameters for submitting a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSendParams {
    /// Caller-supplied task id, unique per manager instance
    pub id: String,

    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    pub message: Message,

    #[serde(rename = "pushNotification", skip_serializing_if = "Option::is_none")]
    pub push_notification: Option<PushNotificationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,

    #[serde(rename = "historyLength", skip_serializing_if = "Option::is_none")]
    pub history_length: Option<usize>,
}

impl TaskSendParams {
    /// Create send parameters for a plain user message
    pub fn new(id: impl Into<String>, message: Message) -> Self {
        Self {
            id: id.into(),
            session_id: None,
            message,
            push_notification: None,
            metadata: None,
            history_length: None,
        }
    }
}
