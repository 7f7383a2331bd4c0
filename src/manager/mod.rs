//! Task lifecycle management
//!
//! The [`TaskManager`] trait is the seam between the protocol server and the
//! actual work an agent performs. [`InMemoryTaskManager`] is the canonical
//! implementation: it owns the task table, drives the lifecycle state
//! machine, merges artifact updates and fans events out to stream
//! subscribers. The work itself is delegated to a [`TaskProcessor`].

pub mod processor;

use std::{
    collections::HashMap,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use async_stream::stream;
use async_trait::async_trait;
use futures::Stream;
use tokio::sync::mpsc;

use crate::protocol::{
    error::{A2AError, A2AResult},
    event::{TaskArtifactUpdateEvent, TaskEvent, TaskStatusUpdateEvent},
    message::Message,
    task::{
        Artifact, PushNotificationConfig, Task, TaskPushNotificationConfig, TaskSendParams,
        TaskState, TaskStatus,
    },
};

pub use processor::{Generate, GenerateProcessor};

/// An ordered stream of task events for one subscriber
pub type EventStream = Pin<Box<dyn Stream<Item = TaskEvent> + Send>>;

/// Processing callback invoked for every submitted task
///
/// Implementations receive the send parameters and return the finished task,
/// carrying a terminal status (or `input-required` to suspend the turn) and
/// any artifacts produced. Errors are converted into a failed task by the
/// manager.
#[async_trait]
pub trait TaskProcessor: Send + Sync {
    async fn process(&self, params: &TaskSendParams) -> A2AResult<Task>;
}

/// Configuration for a task manager instance
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Whether subscribe operations are served
    pub streaming: bool,

    /// Whether push notification configs are accepted
    pub push_notifications: bool,

    /// Idle period after which a subscriber stream ends without error
    pub subscriber_idle_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            streaming: true,
            push_notifications: false,
            subscriber_idle_timeout: Duration::from_secs(300),
        }
    }
}

impl ManagerConfig {
    /// Enable or disable streaming support
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Enable or disable push notification support
    pub fn with_push_notifications(mut self, push_notifications: bool) -> Self {
        self.push_notifications = push_notifications;
        self
    }

    /// Set the subscriber idle timeout
    pub fn with_subscriber_idle_timeout(mut self, timeout: Duration) -> Self {
        self.subscriber_idle_timeout = timeout;
        self
    }
}

/// Storage and lifecycle operations exposed to the protocol server
#[async_trait]
pub trait TaskManager: Send + Sync {
    /// Submit a task and drive it to completion
    async fn create_task(&self, params: TaskSendParams) -> A2AResult<Task>;

    /// Fetch a task by id, optionally truncating its history
    async fn get_task(&self, id: &str, history_length: Option<usize>) -> A2AResult<Task>;

    /// Cancel a non-terminal task
    async fn cancel_task(&self, id: &str) -> A2AResult<Task>;

    /// Store a push notification config for a task
    async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig>;

    /// Fetch the push notification config for a task
    async fn get_push_notification(&self, id: &str) -> A2AResult<TaskPushNotificationConfig>;

    /// Submit a task and stream its events as processing runs in the background
    async fn send_subscribe(&self, params: TaskSendParams) -> A2AResult<EventStream>;

    /// Attach a new subscriber to an existing task
    async fn resubscribe(&self, id: &str, history_length: Option<usize>)
        -> A2AResult<EventStream>;
}

#[derive(Default)]
struct ManagerState {
    tasks: HashMap<String, Task>,
    push_configs: HashMap<String, PushNotificationConfig>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<TaskEvent>>>,
}

struct Inner {
    processor: Arc<dyn TaskProcessor>,
    config: ManagerConfig,
    state: Mutex<ManagerState>,
}

/// In-memory task manager
///
/// Cheap to clone; all clones share the same task table. Per-task mutations
/// (status transitions, artifact merges, subscriber changes) are serialized
/// under one lock, which is never held across an await point.
#[derive(Clone)]
pub struct InMemoryTaskManager {
    inner: Arc<Inner>,
}

impl InMemoryTaskManager {
    /// Create a manager with default configuration
    pub fn new(processor: Arc<dyn TaskProcessor>) -> Self {
        Self::with_config(processor, ManagerConfig::default())
    }

    /// Create a manager with the given configuration
    pub fn with_config(processor: Arc<dyn TaskProcessor>, config: ManagerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                processor,
                config,
                state: Mutex::new(ManagerState::default()),
            }),
        }
    }

    /// Streaming and push capabilities of this manager
    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deliver an event to every live subscriber of a task, pruning dead ones
    fn publish(state: &mut ManagerState, task_id: &str, event: TaskEvent) {
        if let Some(senders) = state.subscribers.get_mut(task_id) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                state.subscribers.remove(task_id);
            }
        }
    }

    /// Whether a status event for this state terminates subscriber streams
    fn ends_stream(state: TaskState) -> bool {
        state.is_terminal() || state == TaskState::InputRequired
    }

    /// Store the task in the submitted state, overwriting any previous task
    /// with the same id
    fn upsert(&self, params: &TaskSendParams) -> A2AResult<()> {
        if params.push_notification.is_some() && !self.inner.config.push_notifications {
            return Err(A2AError::PushNotSupported);
        }
        let mut state = self.lock();

        // The submitted status carries the request message itself
        let status = TaskStatus::with_message(TaskState::Submitted, params.message.clone());
        let mut task = Task::new(&params.id, status)
            .with_session_id(params.session_id.clone())
            .with_metadata(params.metadata.clone());
        task.history = Some(vec![params.message.clone()]);
        state.tasks.insert(params.id.clone(), task);

        if let Some(push) = &params.push_notification {
            state.push_configs.insert(params.id.clone(), push.clone());
        }
        Ok(())
    }

    /// Transition a task and publish the corresponding status event
    fn set_status(&self, task_id: &str, status: TaskStatus, is_final: bool) -> A2AResult<Task> {
        let mut state = self.lock();
        let snapshot = {
            let task = state
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| A2AError::TaskNotFound(task_id.to_string()))?;
            if let Some(message) = &status.message {
                task.history.get_or_insert_with(Vec::new).push(message.clone());
            }
            task.transition_to(status.clone())?;
            task.clone()
        };
        Self::publish(
            &mut state,
            task_id,
            TaskStatusUpdateEvent::new(task_id, status, is_final).into(),
        );
        Ok(snapshot)
    }

    /// Merge an artifact update into a task and publish it to subscribers
    ///
    /// Rejected once the task is terminal. The `is_final` flag is passed
    /// through to the published event as-is.
    pub fn update_artifact(
        &self,
        task_id: &str,
        artifact: Artifact,
        is_final: bool,
    ) -> A2AResult<()> {
        let mut state = self.lock();
        {
            let task = state
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| A2AError::TaskNotFound(task_id.to_string()))?;
            if task.is_terminal() {
                return Err(A2AError::StateConflict(format!(
                    "task {task_id} is in a terminal state"
                )));
            }
            task.merge_artifact(artifact.clone());
        }
        let mut event = TaskArtifactUpdateEvent::new(task_id, artifact);
        event.is_final = is_final;
        Self::publish(&mut state, task_id, event.into());
        Ok(())
    }

    /// Run the processor for a stored task and record the outcome
    ///
    /// If the task reached a terminal state concurrently (a cancel racing the
    /// processor), the stored status wins and the processor result is
    /// discarded.
    async fn run(&self, params: TaskSendParams) -> A2AResult<()> {
        let task_id = params.id.clone();

        if self
            .set_status(&task_id, TaskStatus::new(TaskState::Working), false)
            .is_err()
        {
            return Ok(());
        }

        let outcome = self.inner.processor.process(&params).await;

        let mut state = self.lock();
        let stored = state
            .tasks
            .get(&task_id)
            .ok_or_else(|| A2AError::TaskNotFound(task_id.clone()))?;
        if stored.is_terminal() {
            return Ok(());
        }

        let (status, artifacts) = match outcome {
            Ok(produced) => (produced.status, produced.artifacts.unwrap_or_default()),
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "task processing failed");
                let message = Message::agent(format!("Task processing failed: {e}"));
                (
                    TaskStatus::with_message(TaskState::Failed, message),
                    Vec::new(),
                )
            }
        };

        for artifact in artifacts {
            if let Some(task) = state.tasks.get_mut(&task_id) {
                task.merge_artifact(artifact.clone());
            }
            Self::publish(
                &mut state,
                &task_id,
                TaskArtifactUpdateEvent::new(&task_id, artifact).into(),
            );
        }

        {
            let task = state
                .tasks
                .get_mut(&task_id)
                .ok_or_else(|| A2AError::TaskNotFound(task_id.clone()))?;
            if let Some(message) = &status.message {
                task.history.get_or_insert_with(Vec::new).push(message.clone());
            }
            task.transition_to(status.clone())?;
        }
        let is_final = Self::ends_stream(status.state);
        Self::publish(
            &mut state,
            &task_id,
            TaskStatusUpdateEvent::new(&task_id, status, is_final).into(),
        );
        Ok(())
    }

    /// Build a subscriber stream: backlog replay followed by live events
    fn attach_subscriber(&self, task_id: &str) -> A2AResult<EventStream> {
        if !self.inner.config.streaming {
            return Err(A2AError::StreamingNotSupported);
        }

        let idle_timeout = self.inner.config.subscriber_idle_timeout;
        let (backlog, live) = {
            let mut state = self.lock();
            let task = state
                .tasks
                .get(task_id)
                .ok_or_else(|| A2AError::TaskNotFound(task_id.to_string()))?;

            let terminal = task.is_terminal();
            let mut backlog: Vec<TaskEvent> = Vec::new();
            backlog.push(
                TaskStatusUpdateEvent::new(task_id, task.status.clone(), terminal).into(),
            );
            for artifact in task.artifacts.clone().unwrap_or_default() {
                backlog.push(TaskArtifactUpdateEvent::new(task_id, artifact).into());
            }

            let live = if terminal {
                None
            } else {
                let (tx, rx) = mpsc::unbounded_channel();
                state
                    .subscribers
                    .entry(task_id.to_string())
                    .or_default()
                    .push(tx);
                Some(rx)
            };
            (backlog, live)
        };

        Ok(Box::pin(stream! {
            for event in backlog {
                yield event;
            }
            if let Some(mut rx) = live {
                loop {
                    match tokio::time::timeout(idle_timeout, rx.recv()).await {
                        // Idle expiry ends the stream without error
                        Err(_) => break,
                        Ok(None) => break,
                        Ok(Some(event)) => {
                            let done = event.is_final();
                            yield event;
                            if done {
                                break;
                            }
                        }
                    }
                }
            }
        }))
    }
}

#[async_trait]
impl TaskManager for InMemoryTaskManager {
    async fn create_task(&self, params: TaskSendParams) -> A2AResult<Task> {
        let id = params.id.clone();
        let history_length = params.history_length;
        self.upsert(&params)?;
        self.run(params).await?;
        self.get_task(&id, history_length).await
    }

    async fn get_task(&self, id: &str, history_length: Option<usize>) -> A2AResult<Task> {
        let state = self.lock();
        let mut task = state
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| A2AError::TaskNotFound(id.to_string()))?;
        task.truncate_history(history_length);
        Ok(task)
    }

    async fn cancel_task(&self, id: &str) -> A2AResult<Task> {
        let mut state = self.lock();
        let (snapshot, status) = {
            let task = state
                .tasks
                .get_mut(id)
                .ok_or_else(|| A2AError::TaskNotFound(id.to_string()))?;
            if task.is_terminal() {
                return Err(A2AError::TaskNotCancelable(id.to_string()));
            }
            let message = Message::agent("Task was canceled");
            let status = TaskStatus::with_message(TaskState::Canceled, message.clone());
            task.history.get_or_insert_with(Vec::new).push(message);
            task.transition_to(status.clone())?;
            (task.clone(), status)
        };
        Self::publish(
            &mut state,
            id,
            TaskStatusUpdateEvent::new(id, status, true).into(),
        );
        Ok(snapshot)
    }

    async fn set_push_notification(
        &self,
        config: TaskPushNotificationConfig,
    ) -> A2AResult<TaskPushNotificationConfig> {
        if !self.inner.config.push_notifications {
            return Err(A2AError::PushNotSupported);
        }
        let mut state = self.lock();
        if !state.tasks.contains_key(&config.id) {
            return Err(A2AError::TaskNotFound(config.id.clone()));
        }
        state
            .push_configs
            .insert(config.id.clone(), config.push_notification.clone());
        Ok(config)
    }

    async fn get_push_notification(&self, id: &str) -> A2AResult<TaskPushNotificationConfig> {
        let state = self.lock();
        if !state.tasks.contains_key(id) {
            return Err(A2AError::TaskNotFound(id.to_string()));
        }
        let push_notification = state
            .push_configs
            .get(id)
            .cloned()
            .ok_or_else(|| A2AError::InvalidParams(format!("no push notification config for task {id}")))?;
        Ok(TaskPushNotificationConfig {
            id: id.to_string(),
            push_notification,
        })
    }

    async fn send_subscribe(&self, params: TaskSendParams) -> A2AResult<EventStream> {
        if !self.inner.config.streaming {
            return Err(A2AError::StreamingNotSupported);
        }
        self.upsert(&params)?;
        let stream = self.attach_subscriber(&params.id)?;

        let manager = self.clone();
        tokio::spawn(async move {
            let task_id = params.id.clone();
            if let Err(e) = manager.run(params).await {
                tracing::error!(task_id = %task_id, error = %e, "background task run failed");
            }
        });

        Ok(stream)
    }

    async fn resubscribe(
        &self,
        id: &str,
        _history_length: Option<usize>,
    ) -> A2AResult<EventStream> {
        self.attach_subscriber(id)
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::protocol::message::Part;

    /// Processor that completes every task with a fixed response text
    struct FixedProcessor {
        response: String,
    }

    #[async_trait]
    impl TaskProcessor for FixedProcessor {
        async fn process(&self, params: &TaskSendParams) -> A2AResult<Task> {
            let status = TaskStatus::with_message(
                TaskState::Completed,
                Message::agent(self.response.clone()),
            );
            Ok(Task::new(&params.id, status)
                .with_artifacts(vec![Artifact::new("response", vec![Part::text(
                    self.response.clone(),
                )])]))
        }
    }

    /// Processor that always fails
    struct FailingProcessor;

    #[async_trait]
    impl TaskProcessor for FailingProcessor {
        async fn process(&self, _params: &TaskSendParams) -> A2AResult<Task> {
            Err(A2AError::Internal("model unavailable".into()))
        }
    }

    /// Processor that blocks until told to finish
    struct GatedProcessor {
        gate: tokio::sync::Notify,
    }

    #[async_trait]
    impl TaskProcessor for GatedProcessor {
        async fn process(&self, params: &TaskSendParams) -> A2AResult<Task> {
            self.gate.notified().await;
            Ok(Task::new(
                &params.id,
                TaskStatus::with_message(TaskState::Completed, Message::agent("late")),
            ))
        }
    }

    fn fixed_manager(response: &str) -> InMemoryTaskManager {
        InMemoryTaskManager::new(Arc::new(FixedProcessor {
            response: response.to_string(),
        }))
    }

    fn params(id: &str, text: &str) -> TaskSendParams {
        TaskSendParams::new(id, Message::user(text))
    }

    #[tokio::test]
    async fn test_create_task_completes() {
        let manager = fixed_manager("done");
        let task = manager.create_task(params("t1", "hello")).await.unwrap();

        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(
            task.status.message.as_ref().unwrap().text_content(),
            "done"
        );
        let artifacts = task.artifacts.as_ref().unwrap();
        assert_eq!(artifacts[0].text_content(), "done");
    }

    #[tokio::test]
    async fn test_create_task_records_history() {
        let manager = fixed_manager("done");
        let task = manager.create_task(params("t1", "hello")).await.unwrap();

        let history = task.history.as_ref().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text_content(), "hello");
        assert_eq!(history[1].text_content(), "done");
    }

    #[tokio::test]
    async fn test_failed_processor_marks_task_failed() {
        let manager = InMemoryTaskManager::new(Arc::new(FailingProcessor));
        let task = manager.create_task(params("t1", "hello")).await.unwrap();

        assert_eq!(task.status.state, TaskState::Failed);
        assert_eq!(
            task.status.message.as_ref().unwrap().text_content(),
            "Task processing failed: Internal error: model unavailable"
        );
    }

    #[tokio::test]
    async fn test_get_task_unknown_id() {
        let manager = fixed_manager("done");
        let result = manager.get_task("missing", None).await;
        assert!(matches!(result, Err(A2AError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_task_history_truncation() {
        let manager = fixed_manager("done");
        manager.create_task(params("t1", "hello")).await.unwrap();

        let task = manager.get_task("t1", Some(1)).await.unwrap();
        let history = task.history.as_ref().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text_content(), "done");

        let task = manager.get_task("t1", Some(0)).await.unwrap();
        assert!(task.history.is_none());
    }

    #[tokio::test]
    async fn test_cancel_completed_task_fails() {
        let manager = fixed_manager("done");
        manager.create_task(params("t1", "hello")).await.unwrap();

        let result = manager.cancel_task("t1").await;
        assert!(matches!(result, Err(A2AError::TaskNotCancelable(_))));
    }

    #[tokio::test]
    async fn test_cancel_unknown_task() {
        let manager = fixed_manager("done");
        let result = manager.cancel_task("missing").await;
        assert!(matches!(result, Err(A2AError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_wins_race_with_processor() {
        let processor = Arc::new(GatedProcessor {
            gate: tokio::sync::Notify::new(),
        });
        let manager = InMemoryTaskManager::new(processor.clone());

        let runner = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.create_task(params("t1", "hello")).await })
        };

        // Wait for the task to reach WORKING, then cancel before the
        // processor is released
        loop {
            if let Ok(task) = manager.get_task("t1", None).await {
                if task.status.state == TaskState::Working {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        manager.cancel_task("t1").await.unwrap();
        processor.gate.notify_one();

        let task = runner.await.unwrap().unwrap();
        assert_eq!(task.status.state, TaskState::Canceled);
    }

    #[tokio::test]
    async fn test_push_notification_disabled_by_default() {
        let manager = fixed_manager("done");
        manager.create_task(params("t1", "hello")).await.unwrap();

        let config = TaskPushNotificationConfig {
            id: "t1".into(),
            push_notification: PushNotificationConfig {
                url: "http://localhost:9999/hook".into(),
                token: None,
                authentication: None,
            },
        };
        let result = manager.set_push_notification(config).await;
        assert!(matches!(result, Err(A2AError::PushNotSupported)));
    }

    #[tokio::test]
    async fn test_push_notification_round_trip() {
        let manager = InMemoryTaskManager::with_config(
            Arc::new(FixedProcessor {
                response: "done".into(),
            }),
            ManagerConfig::default().with_push_notifications(true),
        );
        manager.create_task(params("t1", "hello")).await.unwrap();

        let config = TaskPushNotificationConfig {
            id: "t1".into(),
            push_notification: PushNotificationConfig {
                url: "http://localhost:9999/hook".into(),
                token: Some("secret".into()),
                authentication: None,
            },
        };
        manager.set_push_notification(config.clone()).await.unwrap();

        let fetched = manager.get_push_notification("t1").await.unwrap();
        assert_eq!(fetched.push_notification, config.push_notification);
    }

    #[tokio::test]
    async fn test_send_subscribe_streams_lifecycle() {
        let manager = fixed_manager("done");
        let stream = manager
            .send_subscribe(params("t1", "hello"))
            .await
            .unwrap();
        let events: Vec<TaskEvent> = stream.collect().await;

        // submitted, working, artifact, completed
        assert_eq!(events.len(), 4);
        match &events[0] {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Submitted);
                // The submitted status echoes the request message
                assert_eq!(
                    e.status.message.as_ref().map(Message::text_content),
                    Some("hello".to_string())
                );
            }
            other => panic!("expected status event, got {other:?}"),
        }
        match &events[2] {
            TaskEvent::Artifact(e) => assert_eq!(e.artifact.text_content(), "done"),
            other => panic!("expected artifact event, got {other:?}"),
        }
        match &events[3] {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Completed);
                assert!(e.is_final);
            }
            other => panic!("expected status event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resubscribe_replays_backlog_for_terminal_task() {
        let manager = fixed_manager("done");
        manager.create_task(params("t1", "hello")).await.unwrap();

        let stream = manager.resubscribe("t1", None).await.unwrap();
        let events: Vec<TaskEvent> = stream.collect().await;

        assert_eq!(events.len(), 2);
        match &events[0] {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Completed);
                assert!(e.is_final);
            }
            other => panic!("expected status event, got {other:?}"),
        }
        assert!(matches!(&events[1], TaskEvent::Artifact(_)));
    }

    #[tokio::test]
    async fn test_resubscribe_unknown_task() {
        let manager = fixed_manager("done");
        let result = manager.resubscribe("missing", None).await;
        assert!(matches!(result, Err(A2AError::TaskNotFound(_))));
    }

    #[tokio::test]
    async fn test_streaming_disabled() {
        let manager = InMemoryTaskManager::with_config(
            Arc::new(FixedProcessor {
                response: "done".into(),
            }),
            ManagerConfig::default().with_streaming(false),
        );
        let result = manager.send_subscribe(params("t1", "hello")).await;
        assert!(matches!(result, Err(A2AError::StreamingNotSupported)));
    }

    #[tokio::test]
    async fn test_concurrent_subscribers_each_get_all_events() {
        let processor = Arc::new(GatedProcessor {
            gate: tokio::sync::Notify::new(),
        });
        let manager = InMemoryTaskManager::new(processor.clone());

        let first = manager.send_subscribe(params("t1", "hello")).await.unwrap();
        let second = manager.resubscribe("t1", None).await.unwrap();
        processor.gate.notify_one();

        let first: Vec<TaskEvent> = first.collect().await;
        let second: Vec<TaskEvent> = second.collect().await;

        // Both streams end on the same final status
        assert!(first.last().unwrap().is_final());
        assert!(second.last().unwrap().is_final());
        for events in [&first, &second] {
            match events.last().unwrap() {
                TaskEvent::Status(e) => assert_eq!(e.status.state, TaskState::Completed),
                other => panic!("expected status event, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_update_artifact_rejected_on_terminal_task() {
        let manager = fixed_manager("done");
        manager.create_task(params("t1", "hello")).await.unwrap();

        let result =
            manager.update_artifact("t1", Artifact::new("late", vec![Part::text("x")]), false);
        assert!(matches!(result, Err(A2AError::StateConflict(_))));
    }

    #[tokio::test]
    async fn test_update_artifact_reaches_subscribers() {
        let processor = Arc::new(GatedProcessor {
            gate: tokio::sync::Notify::new(),
        });
        let manager = InMemoryTaskManager::new(processor.clone());

        let stream = manager.send_subscribe(params("t1", "hello")).await.unwrap();
        loop {
            if let Ok(task) = manager.get_task("t1", None).await {
                if task.status.state == TaskState::Working {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        manager
            .update_artifact("t1", Artifact::new("chunk", vec![Part::text("partial")]), false)
            .unwrap();
        processor.gate.notify_one();

        let events: Vec<TaskEvent> = stream.collect().await;
        assert!(events
            .iter()
            .any(|e| matches!(e, TaskEvent::Artifact(a) if a.artifact.text_content() == "partial")));
        assert!(events.last().unwrap().is_final());
    }

    #[tokio::test]
    async fn test_resubscribe_replays_artifacts_before_live_events() {
        let processor = Arc::new(GatedProcessor {
            gate: tokio::sync::Notify::new(),
        });
        let manager = InMemoryTaskManager::new(processor.clone());

        let _first = manager.send_subscribe(params("t1", "hello")).await.unwrap();
        loop {
            if let Ok(task) = manager.get_task("t1", None).await {
                if task.status.state == TaskState::Working {
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        manager
            .update_artifact("t1", Artifact::new("chunk", vec![Part::text("alpha")]), false)
            .unwrap();
        manager
            .update_artifact(
                "t1",
                Artifact::new("chunk", vec![Part::text("beta")]).with_index(1),
                false,
            )
            .unwrap();

        let stream = manager.resubscribe("t1", None).await.unwrap();
        processor.gate.notify_one();
        let events: Vec<TaskEvent> = stream.collect().await;

        // Initial status, both artifact replays in order, then live events
        assert_eq!(events.len(), 4);
        match &events[0] {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Working);
                assert!(!e.is_final);
            }
            other => panic!("expected status event, got {other:?}"),
        }
        match &events[1] {
            TaskEvent::Artifact(e) => assert_eq!(e.artifact.text_content(), "alpha"),
            other => panic!("expected artifact event, got {other:?}"),
        }
        match &events[2] {
            TaskEvent::Artifact(e) => assert_eq!(e.artifact.text_content(), "beta"),
            other => panic!("expected artifact event, got {other:?}"),
        }
        match &events[3] {
            TaskEvent::Status(e) => {
                assert_eq!(e.status.state, TaskState::Completed);
                assert!(e.is_final);
            }
            other => panic!("expected status event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_subscriber_idle_timeout_ends_stream() {
        let processor = Arc::new(GatedProcessor {
            gate: tokio::sync::Notify::new(),
        });
        let manager = InMemoryTaskManager::with_config(
            processor.clone(),
            ManagerConfig::default().with_subscriber_idle_timeout(Duration::from_millis(30)),
        );

        let stream = manager.send_subscribe(params("t1", "hello")).await.unwrap();
        // Processor never released; stream must still end
        let events: Vec<TaskEvent> = stream.collect().await;
        assert!(!events.is_empty());
        assert!(!events.last().unwrap().is_final());
        processor.gate.notify_one();
    }
}
