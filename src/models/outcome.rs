// src/models/outcome.rs

//! Fetch and harvest outcome types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::record::NormalizedRecord;

/// Why a fetch attempt failed in a retryable way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCause {
    /// The configured per-attempt timeout elapsed.
    Timeout,
    /// Connection could not be established or was dropped.
    Connect,
    /// Upstream returned a retryable status code.
    Status(u16),
}

impl fmt::Display for TransientCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransientCause::Timeout => f.write_str("request timeout"),
            TransientCause::Connect => f.write_str("connection error"),
            TransientCause::Status(code) => write!(f, "HTTP {code}"),
        }
    }
}

/// Classified result of one transport attempt.
///
/// Produced once per attempt and consumed immediately by the backoff
/// controller.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx response. Body bytes plus any charset from `Content-Type`.
    Success {
        body: Vec<u8>,
        charset: Option<String>,
    },
    /// 429 response, with the `Retry-After` hint when the header parsed.
    RateLimited { retry_after: Option<Duration> },
    /// Retryable failure: 5xx, connect error, or timeout.
    Transient { cause: TransientCause },
    /// 401/403. Surfaced immediately, never retried.
    Fatal { status: u16 },
}

/// One page's normalized result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedPage {
    pub records: Vec<NormalizedRecord>,
    /// Records dropped for missing a required field.
    pub dropped: usize,
    /// Whether upstream indicated (or the page implied) a next page.
    pub has_next: bool,
}

/// A contained per-page failure, reported alongside partial results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    pub page: u32,
    pub error: String,
}

/// Summary of a harvest run.
///
/// Callers always receive the accumulated records together with the
/// failure accounting; a run never returns a silent empty result.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub records: Vec<NormalizedRecord>,
    /// Pages that completed the full pipeline.
    pub pages_fetched: usize,
    /// Pages that failed after their retry budget, with the cause.
    pub failures: Vec<PageFailure>,
    /// Records dropped across all pages for schema violations.
    pub dropped_records: usize,
}

impl HarvestOutcome {
    /// Whether every attempted page produced records.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_cause_display() {
        assert_eq!(TransientCause::Status(503).to_string(), "HTTP 503");
        assert_eq!(TransientCause::Timeout.to_string(), "request timeout");
    }

    #[test]
    fn outcome_clean_only_without_failures() {
        let mut outcome = HarvestOutcome::default();
        assert!(outcome.is_clean());
        outcome.failures.push(PageFailure {
            page: 2,
            error: "retries exhausted".into(),
        });
        assert!(!outcome.is_clean());
    }
}
