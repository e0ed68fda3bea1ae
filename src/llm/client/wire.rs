//! Request and response shapes for the two completion APIs.

use serde::{Deserialize, Serialize};

use crate::models::Provider;

/// Anthropic messages API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Request body shared by both APIs: a single user turn.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: [ChatMessage<'a>; 1],
}

impl<'a> CompletionRequest<'a> {
    pub fn user(model: &'a str, max_tokens: u32, prompt: &'a str) -> Self {
        Self {
            model,
            max_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// Path appended to the provider endpoint.
pub fn request_path(provider: Provider) -> &'static str {
    match provider {
        Provider::Anthropic => "/v1/messages",
        Provider::OpenAi => "/v1/chat/completions",
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Leading text of the placeholder recorded for a malformed response.
pub const MALFORMED_PREFIX: &str = "[malformed ";

pub fn is_malformed_placeholder(text: &str) -> bool {
    text.starts_with(MALFORMED_PREFIX)
}

/// Outcome of decoding a successful HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    /// The provider answered but not in the expected shape.
    Malformed { provider: Provider, reason: String },
}

impl Completion {
    /// Text to record for the item. Malformed responses become a readable placeholder.
    pub fn into_text(self) -> String {
        match self {
            Completion::Text(text) => text,
            Completion::Malformed { provider, reason } => {
                format!(
                    "{}{} response: {}]",
                    MALFORMED_PREFIX,
                    provider.display_name(),
                    reason
                )
            }
        }
    }
}

/// Decode a response body according to the provider's response shape.
///
/// Missing or empty text is reported as malformed.
pub fn decode(provider: Provider, body: &str) -> Completion {
    let malformed = |reason: String| Completion::Malformed { provider, reason };

    match provider {
        Provider::Anthropic => match serde_json::from_str::<AnthropicResponse>(body) {
            Ok(resp) => resp
                .content
                .into_iter()
                .next()
                .and_then(|block| block.text)
                .filter(|text| !text.is_empty())
                .map(Completion::Text)
                .unwrap_or_else(|| malformed("no text in first content block".to_string())),
            Err(e) => malformed(e.to_string()),
        },
        Provider::OpenAi => match serde_json::from_str::<OpenAiResponse>(body) {
            Ok(resp) => resp
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .filter(|text| !text.is_empty())
                .map(Completion::Text)
                .unwrap_or_else(|| malformed("no message content in first choice".to_string())),
            Err(e) => malformed(e.to_string()),
        },
    }
}
