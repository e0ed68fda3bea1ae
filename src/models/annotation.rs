//! Annotation results produced by a dispatch round.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// External completion provider.
///
/// On the wire the variants are `"A"` and `"B"`; the vendor names are
/// accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Anthropic Messages API (text at `content[0].text`).
    #[serde(rename = "A", alias = "anthropic")]
    Anthropic,
    /// OpenAI Chat Completions API (text at `choices[0].message.content`).
    #[serde(rename = "B", alias = "openai")]
    OpenAi,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Anthropic, Provider::OpenAi];

    /// Short wire code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Anthropic => "A",
            Self::OpenAi => "B",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAi => "OpenAI",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "a" | "anthropic" => Some(Self::Anthropic),
            "b" | "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown provider '{}' (expected A or B)", s))
    }
}

/// Model output attached to an entry by a completed round.
///
/// A new round replaces the previous result wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResult {
    pub provider: Provider,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_at: Option<DateTime<Utc>>,
}

impl AiResult {
    pub fn new(provider: Provider, raw_text: impl Into<String>) -> Self {
        Self {
            provider,
            raw_text: raw_text.into(),
            annotated_at: Some(Utc::now()),
        }
    }

    /// Structured decoding of `raw_text`, derived on demand.
    pub fn parsed_value(&self) -> Option<Value> {
        extract_structured(&self.raw_text)
    }
}

/// Try to decode model output as JSON.
///
/// Accepts a bare JSON document, a fenced code block, or a JSON object
/// embedded in surrounding prose. Returns `None` when nothing decodes.
pub fn extract_structured(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced) {
            return Some(value);
        }
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

/// Contents of the first ``` fenced block, without its language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}
