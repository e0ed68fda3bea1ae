//! Scripted completion client for tests.
//!
//! The reply depends on markers in the prompt:
//! - `FAIL` returns an API error
//! - `HANG` never answers within the client timeout
//! - `SLOW:<ms>` sleeps before answering
//! - `REPLY:<text>` answers with `<text>` (up to the end of the prompt)
//!
//! Otherwise the reply is `ok:<n>` where `n` counts completed calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{CompletionClient, LlmError};
use crate::models::Provider;

pub struct ScriptedClient {
    provider: Provider,
    timeout: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(provider: Provider) -> Arc<Self> {
        Self::with_timeout(provider, Duration::from_secs(5))
    }

    pub fn with_timeout(provider: Provider, timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            provider,
            timeout,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn marker_value<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    prompt.find(marker).map(|at| &prompt[at + marker.len()..])
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn max_tokens(&self) -> u32 {
        200
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn complete(&self, prompt: &str, _max_tokens: u32) -> Result<String, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(ms) = marker_value(prompt, "SLOW:")
            .and_then(|rest| rest.split(|c: char| !c.is_ascii_digit()).next())
            .and_then(|digits| digits.parse::<u64>().ok())
        {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
        if prompt.contains("HANG") {
            tokio::time::sleep(self.timeout * 20).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if prompt.contains("FAIL") {
            return Err(LlmError::Api("HTTP 429: quota exceeded".to_string()));
        }
        if let Some(reply) = marker_value(prompt, "REPLY:") {
            return Ok(reply.to_string());
        }
        Ok(format!("ok:{}", n))
    }
}
