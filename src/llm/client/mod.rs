//! HTTP completion clients for the annotation providers.
//!
//! Both providers take a single user turn and return one block of text.
//! Transport failures are errors; a response in an unexpected shape is
//! rendered as a placeholder string instead.

mod config;
mod prompts;
mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::models::Provider;

pub use config::{
    LlmConfig, ProviderConfig, ProviderSettings, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_TOKENS,
    DEFAULT_TIMEOUT_MS,
};
pub use prompts::annotation_prompt;
pub use wire::{
    decode, is_malformed_placeholder, Completion, ANTHROPIC_VERSION, MALFORMED_PREFIX,
};

/// A provider that turns a prompt into text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Token budget used when the caller has no preference.
    fn max_tokens(&self) -> u32;

    /// Upper bound on a single call.
    fn timeout(&self) -> Duration;

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

/// Completion client speaking either provider's HTTP API.
pub struct HttpCompletionClient {
    settings: ProviderSettings,
    client: Client,
}

impl HttpCompletionClient {
    /// Create a client. Fails when the provider has no API key.
    pub fn new(settings: ProviderSettings) -> Result<Self, LlmError> {
        if settings.api_key.is_none() {
            return Err(LlmError::NotConfigured(settings.provider));
        }

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let key = self.settings.api_key.as_deref().unwrap_or_default();
        let builder = self.client.post(url);
        match self.settings.provider {
            Provider::Anthropic => builder
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::OpenAi => builder.bearer_auth(key),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    fn provider(&self) -> Provider {
        self.settings.provider
    }

    fn max_tokens(&self) -> u32 {
        self.settings.max_tokens
    }

    fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let provider = self.settings.provider;
        let url = format!("{}{}", self.settings.endpoint, wire::request_path(provider));
        let body = wire::CompletionRequest::user(&self.settings.model, max_tokens, prompt);

        debug!("Calling {} model {}", provider, self.settings.model);
        let resp = self.request(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.settings.timeout)
            } else {
                LlmError::Connection(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let text = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.settings.timeout)
            } else {
                LlmError::Connection(e.to_string())
            }
        })?;

        match decode(provider, &text) {
            Completion::Text(text) => Ok(text),
            malformed => {
                warn!("Unexpected response shape from {}", provider);
                Ok(malformed.into_text())
            }
        }
    }
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Failed to reach the provider
    Connection(String),
    /// The call did not settle within its timeout
    Timeout(Duration),
    /// Provider returned an error status
    Api(String),
    /// No credentials for the provider
    NotConfigured(Provider),
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            LlmError::Timeout(after) => {
                write!(f, "request timed out after {}ms", after.as_millis())
            }
            LlmError::Api(msg) => write!(f, "API error: {}", msg),
            LlmError::NotConfigured(provider) => {
                write!(f, "{} API key is not configured", provider)
            }
        }
    }
}

impl std::error::Error for LlmError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(provider: Provider, server: &MockServer) -> ProviderSettings {
        LlmConfig::base_default()
            .with_api_key(provider, "test-key")
            .with_endpoint(provider, &server.uri())
            .settings(provider)
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let settings = LlmConfig::base_default().settings(Provider::OpenAi);
        assert_eq!(
            HttpCompletionClient::new(settings).err(),
            Some(LlmError::NotConfigured(Provider::OpenAi))
        );
    }

    #[tokio::test]
    async fn test_anthropic_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-3-5-sonnet-20240620",
                "max_tokens": 200,
                "messages": [{"role": "user", "content": "count it"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "12 layoffs"}]
            })))
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(settings_for(Provider::Anthropic, &server)).unwrap();
        let text = client.complete("count it", client.max_tokens()).await.unwrap();
        assert_eq!(text, "12 layoffs");
    }

    #[tokio::test]
    async fn test_openai_wire_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({"model": "gpt-4o-mini", "max_tokens": 50})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"count\": 3}"}}]
            })))
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(settings_for(Provider::OpenAi, &server)).unwrap();
        let text = client.complete("count it", 50).await.unwrap();
        assert_eq!(text, "{\"count\": 3}");
    }

    #[tokio::test]
    async fn test_malformed_shape_is_placeholder_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(settings_for(Provider::OpenAi, &server)).unwrap();
        let text = client.complete("p", 10).await.unwrap();
        assert!(text.starts_with("[malformed OpenAI response:"));
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = HttpCompletionClient::new(settings_for(Provider::Anthropic, &server)).unwrap();
        match client.complete("p", 10).await {
            Err(LlmError::Api(msg)) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("rate limited"));
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": [{"text": "late"}]}))
                    .set_delay(Duration::from_millis(800)),
            )
            .mount(&server)
            .await;

        let mut settings = settings_for(Provider::Anthropic, &server);
        settings.timeout = Duration::from_millis(50);
        let client = HttpCompletionClient::new(settings).unwrap();

        let err = client.complete("p", 10).await.unwrap_err();
        assert_eq!(err, LlmError::Timeout(Duration::from_millis(50)));
        assert_eq!(err.to_string(), "request timed out after 50ms");
    }
}
