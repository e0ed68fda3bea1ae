//! LLM client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::Provider;

/// Default number of completion calls in flight per round.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
/// Default response token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 200;
/// Default per-call timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Options for one provider. Unset fields fall back to that provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (usually supplied through the environment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Maximum tokens in each response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Per-call timeout in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fully resolved options for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub endpoint: String,
}

/// Configuration for the annotation providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Upper bound on concurrent completion calls in one round
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Provider A
    #[serde(default, skip_serializing_if = "ProviderConfig::is_empty")]
    pub anthropic: ProviderConfig,
    /// Provider B
    #[serde(default, skip_serializing_if = "ProviderConfig::is_empty")]
    pub openai: ProviderConfig,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_model(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "claude-3-5-sonnet-20240620",
        Provider::OpenAi => "gpt-4o-mini",
    }
}

fn default_endpoint(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "https://api.anthropic.com",
        Provider::OpenAi => "https://api.openai.com",
    }
}

fn env_prefix(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "ANTHROPIC",
        Provider::OpenAi => "OPENAI",
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl LlmConfig {
    /// Defaults without environment overrides.
    pub fn base_default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            anthropic: ProviderConfig::default(),
            openai: ProviderConfig::default(),
        }
    }

    /// Check if the config equals the base default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_MAX_CONCURRENCY`: concurrent calls per round
    /// - `LLM_MAX_TOKENS`, `LLM_TIMEOUT_MS`: apply to both providers
    /// - `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL`, `ANTHROPIC_BASE_URL`
    /// - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_parse::<usize>("LLM_MAX_CONCURRENCY") {
            self.max_concurrency = n;
        }
        let max_tokens = env_parse::<u32>("LLM_MAX_TOKENS");
        let timeout_ms = env_parse::<u64>("LLM_TIMEOUT_MS");

        for provider in Provider::ALL {
            let prefix = env_prefix(provider);
            let config = self.provider_config_mut(provider);
            if let Ok(key) = std::env::var(format!("{prefix}_API_KEY")) {
                if !key.trim().is_empty() {
                    config.api_key = Some(key);
                }
            }
            if let Ok(model) = std::env::var(format!("{prefix}_MODEL")) {
                config.model = Some(model);
            }
            if let Ok(endpoint) = std::env::var(format!("{prefix}_BASE_URL")) {
                config.endpoint = Some(endpoint);
            }
            if max_tokens.is_some() {
                config.max_tokens = max_tokens;
            }
            if timeout_ms.is_some() {
                config.timeout_ms = timeout_ms;
            }
        }
        self
    }

    pub fn provider_config(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::OpenAi => &self.openai,
        }
    }

    fn provider_config_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Anthropic => &mut self.anthropic,
            Provider::OpenAi => &mut self.openai,
        }
    }

    pub fn with_api_key(mut self, provider: Provider, key: &str) -> Self {
        self.provider_config_mut(provider).api_key = Some(key.to_string());
        self
    }

    pub fn with_endpoint(mut self, provider: Provider, endpoint: &str) -> Self {
        self.provider_config_mut(provider).endpoint = Some(endpoint.to_string());
        self
    }

    /// Resolve a provider's options against its defaults.
    pub fn settings(&self, provider: Provider) -> ProviderSettings {
        let config = self.provider_config(provider);
        ProviderSettings {
            provider,
            api_key: config.api_key.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| default_model(provider).to_string()),
            max_tokens: config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: Duration::from_millis(config.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| default_endpoint(provider).to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_fall_back_to_provider_defaults() {
        let config = LlmConfig::base_default();
        let a = config.settings(Provider::Anthropic);
        assert_eq!(a.model, "claude-3-5-sonnet-20240620");
        assert_eq!(a.endpoint, "https://api.anthropic.com");
        assert_eq!(a.max_tokens, 200);
        assert_eq!(a.timeout, Duration::from_millis(60_000));
        assert!(a.api_key.is_none());

        let b = config.settings(Provider::OpenAi);
        assert_eq!(b.model, "gpt-4o-mini");
        assert_eq!(b.endpoint, "https://api.openai.com");
    }

    #[test]
    fn test_partial_provider_table_from_toml() {
        let config: LlmConfig = toml::from_str(
            r#"
            max_concurrency = 8

            [openai]
            model = "gpt-4o"
            timeout_ms = 1500
            endpoint = "http://localhost:9000/"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_concurrency, 8);
        let b = config.settings(Provider::OpenAi);
        assert_eq!(b.model, "gpt-4o");
        assert_eq!(b.timeout, Duration::from_millis(1500));
        assert_eq!(b.endpoint, "http://localhost:9000");
        assert_eq!(b.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(config.anthropic.is_empty());
    }

    #[test]
    fn test_builders_and_is_default() {
        assert!(LlmConfig::base_default().is_default());
        let config = LlmConfig::base_default()
            .with_api_key(Provider::Anthropic, "sk-test")
            .with_endpoint(Provider::Anthropic, "http://127.0.0.1:1");
        assert!(!config.is_default());
        let a = config.settings(Provider::Anthropic);
        assert_eq!(a.api_key.as_deref(), Some("sk-test"));
        assert_eq!(a.endpoint, "http://127.0.0.1:1");
    }
}
