//! Analysis-collaborator seam.
//!
//! The collaborator (an LLM-backed classifier) is consumed through the
//! [`AnalysisClient`] trait; no transport lives in this crate. Every call is
//! wrapped in a bounded timeout and a capped exponential-backoff retry, and
//! the final failure is an [`AnalysisError`] the orchestrator recovers from.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use pulse_core::AnalysisError;

/// Structured prompt payload handed to the collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisPrompt {
    pub system_context: String,
    pub history_summary: String,
    pub latest_utterance: String,
}

/// External analysis collaborator. Implementations own transport, prompt
/// rendering, and model selection; they return the raw JSON text of the
/// analysis.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, prompt: &AnalysisPrompt) -> Result<String>;
}

/// Capped exponential backoff between collaborator attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay_ms: 500, max_delay_ms: 5_000 }
    }
}

impl RetryPolicy {
    /// Delay before retrying after `attempt` failures (base delay doubling,
    /// capped).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Call the collaborator with a per-attempt timeout and the retry policy.
/// Exhausted retries and timeouts both degrade to an [`AnalysisError`] so the
/// caller can fall back deterministically instead of blocking.
pub async fn call_with_retry<C: AnalysisClient + ?Sized>(
    client: &C,
    prompt: &AnalysisPrompt,
    policy: &RetryPolicy,
    timeout: Duration,
) -> Result<String, AnalysisError> {
    let attempts = policy.max_attempts.max(1);
    let mut last_error = AnalysisError::CollaboratorUnavailable("no attempts made".to_string());

    for attempt in 0..attempts {
        match tokio::time::timeout(timeout, client.analyze(prompt)).await {
            Ok(Ok(raw)) => return Ok(raw),
            Ok(Err(error)) => {
                last_error = AnalysisError::CollaboratorUnavailable(error.to_string());
            }
            Err(_) => {
                last_error =
                    AnalysisError::CollaboratorTimeout { timeout_secs: timeout.as_secs() };
            }
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(policy.backoff(attempt)).await;
        }
    }

    Err(last_error)
}
