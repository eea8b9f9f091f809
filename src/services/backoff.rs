// src/services/backoff.rs

//! Backoff controller service.
//!
//! Bounded retry state machine over one page fetch. Delay computation
//! is deterministic (no jitter): `base * 2^attempt`, capped. A
//! `Retry-After` hint from upstream overrides the computed delay for
//! that attempt but is still capped.
//!
//! Cancellation is observed before every attempt and during every
//! sleep; a cancelled run never issues the pending attempt.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::events::{EventSink, HarvestEvent};
use crate::models::{FetchOutcome, RetryConfig};

/// Deterministic exponential backoff policy.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Base delay; attempt `a` sleeps `base * 2^a` before the cap.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
}

impl BackoffPolicy {
    pub fn from_config(retry: &RetryConfig) -> Self {
        Self {
            max_retries: retry.max_retries,
            base: retry.backoff_base(),
            cap: retry.backoff_cap(),
        }
    }

    /// Delay before the retry following 0-indexed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Delay to apply given an optional upstream hint.
    fn delay_with_hint(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.cap),
            None => self.delay_for(attempt),
        }
    }
}

/// Drive attempts of one page fetch until a terminal outcome.
///
/// `attempt_fn` issues a single transport attempt. Returns the
/// successful body and charset, or the terminal error (`Fatal`,
/// `RetriesExhausted`, `Cancelled`).
pub async fn run<F, Fut>(
    policy: &BackoffPolicy,
    page: u32,
    cancel: &CancellationToken,
    sink: &dyn EventSink,
    mut attempt_fn: F,
) -> Result<(Vec<u8>, Option<String>)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<FetchOutcome>>,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        sink.emit(&HarvestEvent::Attempt { page, attempt });
        let outcome = attempt_fn().await?;

        let (cause, hint) = match outcome {
            FetchOutcome::Success { body, charset } => return Ok((body, charset)),
            FetchOutcome::Fatal { status } => {
                sink.emit(&HarvestEvent::Fatal { status });
                return Err(AppError::fatal(status, format!("page {page}")));
            }
            FetchOutcome::RateLimited { retry_after } => ("HTTP 429".to_string(), retry_after),
            FetchOutcome::Transient { cause } => (cause.to_string(), None),
        };

        if attempt >= policy.max_retries {
            return Err(AppError::retries_exhausted(attempt + 1, cause));
        }

        let delay = policy.delay_with_hint(attempt, hint);
        sink.emit(&HarvestEvent::Retry {
            page,
            attempt,
            delay,
            cause,
        });

        tokio::select! {
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
