//! Agent card discovery
//!
//! Cards live at the well-known path `/.well-known/agent.json` under an
//! agent's base URL. Resolved cards are cached per base URL for the lifetime
//! of the resolver; a remote that changes its card needs a fresh resolver or
//! an explicit invalidation.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use url::Url;

use crate::protocol::{
    agent::AgentCard,
    error::{A2AError, A2AResult},
};

/// Well-known path of the agent card, relative to the base URL
pub const CARD_PATH: &str = "/.well-known/agent.json";

/// Fetches and caches agent cards
pub struct CardResolver {
    http: reqwest::Client,
    cache: Mutex<HashMap<String, AgentCard>>,
}

impl CardResolver {
    /// Create a resolver with its own HTTP client
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    /// Create a resolver sharing an existing HTTP client
    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, AgentCard>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Resolve the card for an agent base URL, hitting the network only on
    /// a cache miss
    pub async fn resolve(&self, base_url: &str) -> A2AResult<AgentCard> {
        let base = base_url.trim_end_matches('/').to_string();
        if let Some(card) = self.cache().get(&base) {
            return Ok(card.clone());
        }

        let url = Url::parse(&format!("{base}{CARD_PATH}")).map_err(|e| {
            A2AError::Resolution {
                url: base.clone(),
                reason: e.to_string(),
            }
        })?;

        tracing::debug!(url = %url, "fetching agent card");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| A2AError::Resolution {
                url: base.clone(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(A2AError::Resolution {
                url: base,
                reason: format!("unexpected status {}", response.status()),
            });
        }
        let card: AgentCard = response.json().await.map_err(|e| A2AError::Resolution {
            url: base.clone(),
            reason: e.to_string(),
        })?;

        self.cache().insert(base, card.clone());
        Ok(card)
    }

    /// Drop the cached card for a base URL, if any
    pub fn invalidate(&self, base_url: &str) {
        let base = base_url.trim_end_matches('/');
        self.cache().remove(base);
    }
}

impl Default for CardResolver {
    fn default() -> Self {
        Self::new()
    }
}
