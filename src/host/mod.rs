//! Host agent orchestrating multiple remote agents
//!
//! The host keeps one open client connection per remote base URL, merges the
//! remotes' skills into its own advertised list and routes incoming messages
//! to whichever remote looks responsible. Routing is a pluggable strategy;
//! the default matches skill ids and coarse keywords against the message
//! text.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    client::{A2AClient, ClientConfig},
    protocol::{
        agent::{AgentCard, AgentSkill},
        error::A2AResult,
        message::{Message, Part},
        task::{Task, TaskSendParams, TaskState},
    },
};

/// An open connection to one remote agent
pub struct RemoteAgentConnection {
    url: String,
    card: AgentCard,
    client: A2AClient,
}

impl RemoteAgentConnection {
    /// Resolve the remote's card and open a connection
    pub async fn connect(url: &str, bearer_token: Option<String>) -> A2AResult<Self> {
        let mut config = ClientConfig::default();
        if let Some(token) = bearer_token {
            config = config.with_bearer_token(token);
        }
        let client = A2AClient::with_config(url, config)?;
        let card = client.agent_card().await?.clone();
        tracing::info!(url = %client.base_url(), agent = %card.name, skills = card.skills.len(),
            "connected to remote agent");
        Ok(Self {
            url: client.base_url().to_string(),
            card,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    pub fn client(&self) -> &A2AClient {
        &self.client
    }
}

/// Skill ids advertised by one connected remote, snapshot for routing
#[derive(Debug, Clone)]
pub struct RemoteSkills {
    pub url: String,
    pub skill_ids: Vec<String>,
}

/// A routing decision: which remote should handle the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub url: String,
    pub skill_id: String,
}

/// Strategy for picking a remote agent for a message
///
/// Matching is a heuristic with no formal grammar. When several remotes
/// match equally, implementations are expected to pick the first in
/// connection order.
pub trait RoutingStrategy: Send + Sync {
    fn select(&self, message: &str, remotes: &[RemoteSkills]) -> Option<RouteTarget>;
}

/// Default keyword-based routing
///
/// Tries an exact skill-id substring match against the lowercased message
/// first, then falls back to coarse keyword buckets: code-conversion wording
/// maps to remotes with a `code` skill, data-migration wording to remotes
/// with a `data` skill.
#[derive(Debug, Default)]
pub struct KeywordRouter;

impl RoutingStrategy for KeywordRouter {
    fn select(&self, message: &str, remotes: &[RemoteSkills]) -> Option<RouteTarget> {
        let message = message.to_lowercase();

        for remote in remotes {
            for skill_id in &remote.skill_ids {
                if message.contains(&skill_id.to_lowercase()) {
                    return Some(RouteTarget {
                        url: remote.url.clone(),
                        skill_id: skill_id.clone(),
                    });
                }
            }
        }

        if message.contains("code") || message.contains("convert") {
            for remote in remotes {
                if remote.skill_ids.iter().any(|id| id.contains("code")) {
                    return Some(RouteTarget {
                        url: remote.url.clone(),
                        skill_id: "code-conversion".to_string(),
                    });
                }
            }
        }

        if message.contains("data") || message.contains("migration") || message.contains("database")
        {
            for remote in remotes {
                if remote.skill_ids.iter().any(|id| id.contains("data")) {
                    return Some(RouteTarget {
                        url: remote.url.clone(),
                        skill_id: "data-migration".to_string(),
                    });
                }
            }
        }

        None
    }
}

/// Orchestration agent holding connections to remote agents
///
/// Connection and skill bookkeeping is guarded by one lock, so concurrent
/// connect and disconnect calls for the same URL cannot leave the skill
/// list and the connection table out of step.
pub struct HostAgent {
    remotes: Mutex<Vec<Arc<RemoteAgentConnection>>>,
    skills: Mutex<Vec<AgentSkill>>,
    router: Box<dyn RoutingStrategy>,
    poll_interval: Duration,
}

impl Default for HostAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl HostAgent {
    /// Create a host with the default keyword router
    pub fn new() -> Self {
        Self::with_router(Box::new(KeywordRouter))
    }

    /// Create a host with a custom routing strategy
    pub fn with_router(router: Box<dyn RoutingStrategy>) -> Self {
        Self {
            remotes: Mutex::new(Vec::new()),
            skills: Mutex::new(Vec::new()),
            router,
            poll_interval: Duration::from_millis(500),
        }
    }

    /// Set the interval between task status polls during routing
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn remotes(&self) -> MutexGuard<'_, Vec<Arc<RemoteAgentConnection>>> {
        self.remotes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn skills_guard(&self) -> MutexGuard<'_, Vec<AgentSkill>> {
        self.skills.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Connect to a remote agent; returns the existing connection when the
    /// URL is already connected
    pub async fn connect(
        &self,
        url: &str,
        bearer_token: Option<String>,
    ) -> A2AResult<Arc<RemoteAgentConnection>> {
        let normalized = url.trim_end_matches('/');
        if let Some(existing) = self.find(normalized) {
            return Ok(existing);
        }

        let connection = Arc::new(RemoteAgentConnection::connect(normalized, bearer_token).await?);

        let mut remotes = self.remotes();
        // A concurrent connect for the same URL may have won
        if let Some(existing) = remotes.iter().find(|c| c.url() == normalized) {
            return Ok(existing.clone());
        }
        let mut skills = self.skills_guard();
        for skill in &connection.card().skills {
            skills.push(Self::namespace_skill(connection.card(), skill, normalized));
        }
        remotes.push(connection.clone());
        Ok(connection)
    }

    /// Drop the connection for a URL and its advertised skills; no-op when
    /// not connected
    pub fn disconnect(&self, url: &str) {
        let normalized = url.trim_end_matches('/');
        let mut remotes = self.remotes();
        let mut skills = self.skills_guard();
        remotes.retain(|c| c.url() != normalized);
        let prefix = format!("{normalized}:");
        skills.retain(|skill| !skill.id.starts_with(&prefix));
    }

    /// Skills advertised by this host, including those of connected remotes
    pub fn skills(&self) -> Vec<AgentSkill> {
        self.skills_guard().clone()
    }

    /// Route a message to a connected remote and return its response text
    ///
    /// Never fails: transport and task errors come back as human-readable
    /// strings.
    pub async fn route(&self, message: &str, session_id: Option<String>) -> String {
        let snapshot: Vec<RemoteSkills> = self
            .remotes()
            .iter()
            .map(|c| RemoteSkills {
                url: c.url().to_string(),
                skill_ids: c.card().skills.iter().map(|s| s.id.clone()).collect(),
            })
            .collect();

        if snapshot.is_empty() {
            return "No remote agents connected. Please connect to some agents first.".to_string();
        }

        let Some(target) = self.router.select(message, &snapshot) else {
            return self.capability_summary(message);
        };

        let Some(connection) = self.find(&target.url) else {
            // Disconnected between snapshot and dispatch
            return format!("Remote agent at {} is no longer connected.", target.url);
        };
        tracing::info!(url = %target.url, skill = %target.skill_id, "routing message");

        match self.dispatch(&connection, message, session_id).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(url = %target.url, error = %e, "routing failed");
                format!("Error processing task with remote agent: {e}")
            }
        }
    }

    fn find(&self, url: &str) -> Option<Arc<RemoteAgentConnection>> {
        self.remotes().iter().find(|c| c.url() == url).cloned()
    }

    fn namespace_skill(card: &AgentCard, skill: &AgentSkill, url: &str) -> AgentSkill {
        AgentSkill {
            id: format!("{url}:{}", skill.id),
            name: skill.name.clone(),
            description: Some(format!(
                "[From {}] {}",
                card.name,
                skill.description.as_deref().unwrap_or("")
            )),
            tags: skill.tags.clone(),
            examples: skill.examples.clone(),
            input_modes: skill
                .input_modes
                .clone()
                .or_else(|| Some(card.default_input_modes.clone())),
            output_modes: skill
                .output_modes
                .clone()
                .or_else(|| Some(card.default_output_modes.clone())),
        }
    }

    /// Send the message as a task and poll it to a terminal state
    async fn dispatch(
        &self,
        connection: &RemoteAgentConnection,
        message: &str,
        session_id: Option<String>,
    ) -> A2AResult<String> {
        let mut params = TaskSendParams::new(A2AClient::new_task_id(), Message::user(message));
        params.session_id = session_id;

        let mut task = connection.client().send_task(params).await?;
        while !task.is_terminal() {
            tokio::time::sleep(self.poll_interval).await;
            task = connection.client().get_task(&task.id, None).await?;
        }
        Ok(Self::extract_response(task))
    }

    /// Pull the response text out of a terminal task
    fn extract_response(task: Task) -> String {
        if task.status.state == TaskState::Completed {
            if let Some(message) = &task.status.message {
                let text = message.text_content();
                if !text.is_empty() {
                    return text;
                }
            }
            let texts: Vec<&str> = task
                .artifacts
                .iter()
                .flatten()
                .flat_map(|artifact| artifact.parts.iter().filter_map(Part::as_text))
                .collect();
            if !texts.is_empty() {
                return texts.join("\n\n");
            }
            return "Task completed successfully, but no response was provided.".to_string();
        }

        let reason = task
            .status
            .message
            .as_ref()
            .map(Message::text_content)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "Unknown error".to_string());
        format!("Task failed: {reason}")
    }

    fn capability_summary(&self, message: &str) -> String {
        let skills = self.skills();
        let mut lines =
            vec!["I can route your request to these connected agent skills:".to_string()];
        for skill in &skills {
            lines.push(format!("- {} ({})", skill.name, skill.id));
        }
        lines.push(String::new());
        lines.push(format!("Your request: \"{message}\""));
        lines.push(
            "Please mention the skill or the kind of task you need, for example \
             \"convert this code\" or \"migrate this database\"."
                .to_string(),
        );
        lines.join("\n")
    }
}
