//! # A2A Mesh
//!
//! An implementation of the Agent2Agent (A2A) protocol: JSON-RPC 2.0 over
//! HTTP with Server-Sent Event streaming, agent discovery via capability
//! cards, and host-side orchestration of multiple remote agents.
//!
//! ## Features
//!
//! - **Task lifecycle**: submitted, working and terminal states with strict
//!   transition rules, artifact merging and message history
//! - **Server**: axum-based JSON-RPC endpoint plus SSE streaming and the
//!   `/.well-known/agent.json` discovery route
//! - **Client**: reqwest-based client with lazy card resolution, capability
//!   checks and tolerant SSE parsing
//! - **Host**: keyword-routed orchestration across many connected agents
//!
//! ## Example
//!
//! ```rust,no_run
//! use a2a_mesh::prelude::*;
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl Generate for Echo {
//!     async fn generate(&self, prompt: &str) -> A2AResult<String> {
//!         Ok(format!("echo: {prompt}"))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> A2AResult<()> {
//!     let card = AgentCard::new("echo", "http://localhost:8000", "0.1.0")
//!         .with_capabilities(AgentCapabilities {
//!             streaming: true,
//!             ..AgentCapabilities::default()
//!         });
//!     let processor = Arc::new(GenerateProcessor::new(Echo));
//!     let manager = Arc::new(InMemoryTaskManager::new(processor));
//!
//!     A2AServer::new(card, manager)
//!         .serve("127.0.0.1:8000".parse().unwrap())
//!         .await
//! }
//! ```

pub mod client;
pub mod codec;
pub mod host;
pub mod manager;
pub mod protocol;
pub mod server;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        client::{A2AClient, CardResolver, ClientConfig},
        host::{HostAgent, KeywordRouter, RemoteAgentConnection, RoutingStrategy},
        manager::{
            Generate, GenerateProcessor, InMemoryTaskManager, ManagerConfig, TaskManager,
            TaskProcessor,
        },
        protocol::{
            A2AError, A2AResult, AgentCapabilities, AgentCard, AgentSkill, Artifact, Message,
            Part, Role, Task, TaskEvent, TaskSendParams, TaskState, TaskStatus,
        },
        server::A2AServer,
    };
}
