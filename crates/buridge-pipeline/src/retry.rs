// Retry Policy
//
// An explicit policy object injected into the orchestrator, so tests can
// substitute a zero-delay policy. Only whole-pipeline retries exist; the
// individual stages never retry on their own.

use crate::error::{PipelineError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with a fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub pause: Duration,
}

impl RetryPolicy {
    /// Fixed pause between up to `max_attempts` attempts
    pub fn fixed(max_attempts: u32, pause: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            pause,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        RetryPolicy {
            max_attempts: 1,
            pause: Duration::ZERO,
        }
    }

    /// Retry without pausing, for deterministic tests
    pub fn no_delay(max_attempts: u32) -> Self {
        Self::fixed(max_attempts, Duration::ZERO)
    }
}

/// Whether an error can succeed on a later attempt within one invocation
///
/// A missing credential or a date with no published file will not change by
/// waiting a second; those pass straight through the retry wrapper.
fn is_retryable(error: &PipelineError) -> bool {
    !matches!(
        error,
        PipelineError::Config(_) | PipelineError::NotFound { .. }
    )
}

/// Run an operation under a retry policy, returning the last error when all
/// attempts fail
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !is_retryable(&e) => return Err(e),
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Pipeline attempt failed"
                );
                last_error = Some(e);

                if attempt < policy.max_attempts && !policy.pause.is_zero() {
                    tokio::time::sleep(policy.pause).await;
                }
            },
        }
    }

    // max_attempts >= 1, so a failure was always captured
    Err(last_error
        .unwrap_or_else(|| PipelineError::config("retry loop ran zero attempts")))
}

// ============================================================================
// Tests
// ============================================================================
