//! Agent capability card types
//!
//! Every A2A server publishes an [`AgentCard`] at
//! `/.well-known/agent.json` describing its identity, capabilities and
//! skills. Clients fetch the card before talking to an agent to learn what
//! it supports.

use serde::{Deserialize, Serialize};

/// Feature flags advertised by an agent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentCapabilities {
    /// Whether the agent supports SSE streaming methods
    #[serde(default)]
    pub streaming: bool,

    /// Whether the agent supports push notification webhooks
    #[serde(rename = "pushNotifications", default)]
    pub push_notifications: bool,

    /// Whether the agent records state transition history
    #[serde(rename = "stateTransitionHistory", default)]
    pub state_transition_history: bool,
}

/// Organization providing the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentProvider {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Authentication requirements for talking to the agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentAuthentication {
    #[serde(rename = "type")]
    pub auth_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Expected token audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// A discrete capability offered by an agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSkill {
    /// Stable skill identifier
    pub id: String,

    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,

    #[serde(rename = "inputModes", skip_serializing_if = "Option::is_none")]
    pub input_modes: Option<Vec<String>>,

    #[serde(rename = "outputModes", skip_serializing_if = "Option::is_none")]
    pub output_modes: Option<Vec<String>>,
}

impl AgentSkill {
    /// Create a skill with the given id and display name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            tags: None,
            examples: None,
            input_modes: None,
            output_modes: None,
        }
    }

    /// Set the skill description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the skill tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

fn default_modes() -> Vec<String> {
    vec!["text".to_string()]
}

/// Public descriptor of an agent, served at `/.well-known/agent.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentCard {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Base URL where the agent's JSON-RPC endpoint is reachable
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<AgentProvider>,

    pub version: String,

    #[serde(rename = "documentationUrl", skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    #[serde(default)]
    pub capabilities: AgentCapabilities,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AgentAuthentication>,

    #[serde(rename = "defaultInputModes", default = "default_modes")]
    pub default_input_modes: Vec<String>,

    #[serde(rename = "defaultOutputModes", default = "default_modes")]
    pub default_output_modes: Vec<String>,

    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// Create a card with default capabilities and no skills
    pub fn new(name: impl Into<String>, url: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            url: url.into(),
            provider: None,
            version: version.into(),
            documentation_url: None,
            capabilities: AgentCapabilities::default(),
            authentication: None,
            default_input_modes: default_modes(),
            default_output_modes: default_modes(),
            skills: Vec::new(),
        }
    }

    /// Set the card description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the advertised capabilities
    pub fn with_capabilities(mut self, capabilities: AgentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Append a skill to the card
    pub fn add_skill(mut self, skill: AgentSkill) -> Self {
        self.skills.push(skill);
        self
    }
}
