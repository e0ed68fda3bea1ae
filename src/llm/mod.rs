//! Completion providers used by annotation rounds.

pub mod client;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::Provider;

pub use client::{
    annotation_prompt, is_malformed_placeholder, CompletionClient, HttpCompletionClient,
    LlmConfig, LlmError, ProviderConfig, ProviderSettings,
};

/// The set of completion clients available to a process, keyed by provider.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<Provider, Arc<dyn CompletionClient>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP clients for every provider that has credentials.
    pub fn from_config(config: &LlmConfig) -> Self {
        let mut registry = Self::new();
        for provider in Provider::ALL {
            match HttpCompletionClient::new(config.settings(provider)) {
                Ok(client) => registry = registry.with_client(Arc::new(client)),
                Err(LlmError::NotConfigured(_)) => {
                    debug!("{} not configured, skipping", provider);
                }
                Err(e) => warn!("Failed to create {} client: {}", provider, e),
            }
        }
        registry
    }

    /// Register a client, replacing any existing one for the same provider.
    pub fn with_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    pub fn get(&self, provider: Provider) -> Result<Arc<dyn CompletionClient>, LlmError> {
        self.clients
            .get(&provider)
            .cloned()
            .ok_or(LlmError::NotConfigured(provider))
    }

    pub fn configured(&self) -> Vec<Provider> {
        Provider::ALL
            .into_iter()
            .filter(|p| self.clients.contains_key(p))
            .collect()
    }
}
