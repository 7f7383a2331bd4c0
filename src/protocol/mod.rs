//! A2A protocol data model
//!
//! Wire types shared by every layer of the crate: messages and their parts,
//! tasks and their lifecycle, agent capability cards, streaming events and
//! the error taxonomy with its JSON-RPC code mapping.

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod task;

pub use agent::{
    AgentAuthentication, AgentCapabilities, AgentCard, AgentProvider, AgentSkill,
};
pub use error::{A2AError, A2AResult};
pub use event::{TaskArtifactUpdateEvent, TaskEvent, TaskStatusUpdateEvent};
pub use message::{FileContent, Message, Part, Role};
pub use task::{
    Artifact, PushNotificationConfig, Task, TaskIdParams, TaskPushNotificationConfig,
    TaskQueryParams, TaskSendParams, TaskState, TaskStatus,
};
