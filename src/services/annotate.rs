//! Annotation rounds.
//!
//! A round sends one prompt per article to a provider, runs the calls
//! concurrently behind a semaphore, and returns one string per article in
//! input order. A failed call becomes an inline error string at its slot.

use std::fmt::Display;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::llm::{annotation_prompt, LlmConfig, LlmError, ProviderRegistry};
use crate::models::Provider;

/// Prefix shared by every per-item error string.
pub const ITEM_ERROR_PREFIX: &str = "Error processing article ";

/// Events emitted while a round is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// Round started
    Started { total: usize, provider: Provider },
    /// One article answered
    ItemCompleted { index: usize },
    /// One article failed
    ItemFailed { index: usize, error: String },
    /// Every call has settled
    Complete { succeeded: usize, failed: usize },
}

/// Inline error recorded for the article at `index` (zero-based).
pub fn item_error(index: usize, error: impl Display) -> String {
    format!("{}{}: {}", ITEM_ERROR_PREFIX, index + 1, error)
}

pub fn is_item_error(text: &str) -> bool {
    text.starts_with(ITEM_ERROR_PREFIX)
}

/// Fans out annotation prompts to a provider with bounded concurrency.
#[derive(Clone)]
pub struct AnnotationDispatcher {
    providers: ProviderRegistry,
    max_concurrency: usize,
}

impl AnnotationDispatcher {
    pub fn new(providers: ProviderRegistry, max_concurrency: usize) -> Self {
        Self {
            providers,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(ProviderRegistry::from_config(config), config.max_concurrency)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Run a round and return one result per body, aligned by index.
    ///
    /// Fails as a whole only when the provider has no client.
    pub async fn dispatch(
        &self,
        bodies: &[String],
        instruction: &str,
        provider: Provider,
    ) -> Result<Vec<String>, LlmError> {
        self.dispatch_with_events(bodies, instruction, provider, None)
            .await
    }

    /// Like [`dispatch`](Self::dispatch), reporting progress on `events`.
    pub async fn dispatch_with_events(
        &self,
        bodies: &[String],
        instruction: &str,
        provider: Provider,
        events: Option<mpsc::UnboundedSender<DispatchEvent>>,
    ) -> Result<Vec<String>, LlmError> {
        let client = self.providers.get(provider)?;
        let max_tokens = client.max_tokens();
        let timeout = client.timeout();

        info!(
            "Dispatching {} articles to {} ({} concurrent)",
            bodies.len(),
            provider,
            self.max_concurrency
        );
        emit(
            &events,
            DispatchEvent::Started {
                total: bodies.len(),
                provider,
            },
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let handles: Vec<_> = bodies
            .iter()
            .enumerate()
            .map(|(index, body)| {
                let client = client.clone();
                let semaphore = semaphore.clone();
                let events = events.clone();
                let prompt = annotation_prompt(instruction, body);

                tokio::spawn(async move {
                    let outcome = match semaphore.acquire_owned().await {
                        Ok(_permit) => {
                            match tokio::time::timeout(timeout, client.complete(&prompt, max_tokens))
                                .await
                            {
                                Ok(result) => result,
                                Err(_) => Err(LlmError::Timeout(timeout)),
                            }
                        }
                        Err(e) => Err(LlmError::Connection(e.to_string())),
                    };

                    match &outcome {
                        Ok(_) => {
                            debug!("Article {} annotated", index + 1);
                            emit(&events, DispatchEvent::ItemCompleted { index });
                        }
                        Err(e) => {
                            warn!("Article {} failed: {}", index + 1, e);
                            emit(
                                &events,
                                DispatchEvent::ItemFailed {
                                    index,
                                    error: e.to_string(),
                                },
                            );
                        }
                    }
                    outcome
                })
            })
            .collect();

        // join_all keeps input order regardless of which call settles first
        let settled = join_all(handles).await;

        let mut failed = 0;
        let results: Vec<String> = settled
            .into_iter()
            .enumerate()
            .map(|(index, joined)| match joined {
                Ok(Ok(text)) => text,
                Ok(Err(e)) => {
                    failed += 1;
                    item_error(index, e)
                }
                Err(e) => {
                    failed += 1;
                    warn!("Article {} task aborted: {}", index + 1, e);
                    item_error(index, e)
                }
            })
            .collect();

        let succeeded = results.len() - failed;
        info!(
            "Round complete: {} succeeded, {} failed",
            succeeded, failed
        );
        emit(&events, DispatchEvent::Complete { succeeded, failed });

        Ok(results)
    }
}

fn emit(events: &Option<mpsc::UnboundedSender<DispatchEvent>>, event: DispatchEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
