// src/services/transport.rs

//! Transport executor service.
//!
//! Performs one network round trip per call and classifies the result
//! into a [`FetchOutcome`]. Connection errors and timeouts are
//! transient outcomes rather than hard errors, so the backoff
//! controller sees every retryable condition through one type.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};

use crate::error::Result;
use crate::models::{FetchOutcome, TransientCause};
use crate::services::request::RequestDescriptor;

/// Execute one attempt against upstream.
///
/// The timeout applies to this attempt only. A missed timeout is a
/// `Transient` outcome, not an error.
pub async fn execute(
    client: &reqwest::Client,
    descriptor: &RequestDescriptor,
    timeout: Duration,
) -> Result<FetchOutcome> {
    let mut request = client.get(descriptor.url.clone()).timeout(timeout);
    for (name, value) in &descriptor.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            return Ok(FetchOutcome::Transient {
                cause: TransientCause::Timeout,
            });
        }
        Err(e) if e.is_connect() || e.is_request() => {
            return Ok(FetchOutcome::Transient {
                cause: TransientCause::Connect,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let status = response.status();
    if status.is_success() {
        let charset = charset_of(response.headers());
        let body = response.bytes().await?.to_vec();
        return Ok(FetchOutcome::Success { body, charset });
    }

    let retry_after = parse_retry_after(response.headers());
    Ok(classify_status(status, retry_after))
}

/// Map a non-2xx status to its outcome.
///
/// 401/403 are fatal; 429 is rate limited; everything else is
/// transient and falls under the retry budget.
pub fn classify_status(status: StatusCode, retry_after: Option<Duration>) -> FetchOutcome {
    match status.as_u16() {
        401 | 403 => FetchOutcome::Fatal {
            status: status.as_u16(),
        },
        429 => FetchOutcome::RateLimited { retry_after },
        code => FetchOutcome::Transient {
            cause: TransientCause::Status(code),
        },
    }
}

/// Parse a `Retry-After` header as delay seconds.
///
/// Only the delta-seconds form is honored; the HTTP-date form is
/// ignored and falls back to computed backoff.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Charset parameter of the `Content-Type` header, if declared.
pub fn charset_of(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|part| {
        let part = part.trim();
        part.strip_prefix("charset=")
            .map(|label| label.trim_matches('"').to_ascii_lowercase())
    })
}
