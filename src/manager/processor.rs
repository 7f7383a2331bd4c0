//! Text-generation task processor
//!
//! Adapts a plain prompt-to-text generator into a [`TaskProcessor`]: the
//! incoming message's text parts become the prompt, and the generated reply
//! is recorded both as the terminal status message and as a `response`
//! artifact.

use async_trait::async_trait;

use super::TaskProcessor;
use crate::protocol::{
    error::A2AResult,
    message::{Message, Part},
    task::{Artifact, Task, TaskSendParams, TaskState, TaskStatus},
};

/// A prompt-in, text-out generation backend
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, prompt: &str) -> A2AResult<String>;
}

/// Task processor backed by a [`Generate`] implementation
///
/// Generation failures are caught here and reported as a failed task with an
/// `Error: ...` message, so one bad prompt never tears down the manager.
pub struct GenerateProcessor<G> {
    generator: G,
}

impl<G: Generate> GenerateProcessor<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: Generate> TaskProcessor for GenerateProcessor<G> {
    async fn process(&self, params: &TaskSendParams) -> A2AResult<Task> {
        let prompt = params.message.text_content();

        let task = match self.generator.generate(&prompt).await {
            Ok(response) => {
                let status = TaskStatus::with_message(
                    TaskState::Completed,
                    Message::agent(response.clone()),
                );
                Task::new(&params.id, status)
                    .with_artifacts(vec![Artifact::new("response", vec![Part::text(response)])])
            }
            Err(e) => {
                let status = TaskStatus::with_message(
                    TaskState::Failed,
                    Message::agent(format!("Error: {e}")),
                );
                Task::new(&params.id, status)
            }
        };
        Ok(task)
    }
}
