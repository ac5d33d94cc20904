//! Retry logic for HTTP requests with exponential backoff.
//!
//! Every request walks the same state machine:
//!
//! - transport failure or 5xx: back off exponentially and try again
//! - 429: sleep for the server-suggested `Retry-After` and try again
//! - 401/403 or any other error status: fail immediately
//! - 2xx: parse the body as JSON, failing on garbage
//!
//! Retries are bounded by [`RetryConfig::max_attempts`]; running out promotes
//! the last transient condition to a fatal [`ApiError`].

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::sleep;
use tracing::warn;

use crate::error::{truncate_body, ApiError, Result};

/// Default initial backoff duration for retries (1 second).
pub(crate) const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 1;

/// Default maximum backoff duration for retries (30 seconds).
pub(crate) const DEFAULT_MAX_BACKOFF_SECS: u64 = 30;

/// Default number of attempts per request, including the first one.
pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Delay used for a 429 without a usable `Retry-After` header.
pub(crate) const DEFAULT_RATE_LIMIT_DELAY_SECS: u64 = 2;

/// Shortest delay honoured for a 429.
pub(crate) const MIN_RATE_LIMIT_DELAY_SECS: u64 = 1;

/// Longest delay honoured for a 429.
pub(crate) const MAX_RATE_LIMIT_DELAY_SECS: u64 = 300;

/// Configuration for retry behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles for each later attempt.
    pub initial_backoff: Duration,
    /// Ceiling for exponential backoff.
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_secs(DEFAULT_INITIAL_BACKOFF_SECS),
            max_backoff: Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
        }
    }
}

impl RetryConfig {
    /// Calculates the exponential backoff after a failed attempt.
    ///
    /// `attempt` is 1-based: the delay after attempt `n` is
    /// `initial * 2^(n-1)`, capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Converts a `Retry-After` header value into a sleep duration.
///
/// Decimal seconds are truncated. Missing, unparsable or non-finite values
/// fall back to 2 seconds. The result is clamped to 1..=300 seconds.
pub fn rate_limit_delay(retry_after: Option<&str>) -> Duration {
    let secs = retry_after
        .map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| (v.trunc() as u64).clamp(MIN_RATE_LIMIT_DELAY_SECS, MAX_RATE_LIMIT_DELAY_SECS))
        .unwrap_or(DEFAULT_RATE_LIMIT_DELAY_SECS);
    Duration::from_secs(secs)
}

/// What a single attempt produced.
enum Outcome {
    /// Parsed JSON body of a 2xx response.
    Success(Value),
    /// The request never produced a usable response.
    Transport(String),
    /// HTTP 429 with the raw `Retry-After` header, if any.
    RateLimited { retry_after: Option<String> },
    /// HTTP 5xx.
    ServerError { status: u16 },
    /// Anything that must not be retried.
    Fatal(ApiError),
}

/// Reads the body of an error response, dropping it when empty or unreadable.
async fn error_body(response: reqwest::Response) -> Option<String> {
    response
        .text()
        .await
        .ok()
        .filter(|body| !body.trim().is_empty())
}

/// Classifies an HTTP response into an [`Outcome`].
async fn classify_response(response: reqwest::Response) -> Outcome {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        return Outcome::RateLimited { retry_after };
    }

    if status.is_server_error() {
        return Outcome::ServerError {
            status: status.as_u16(),
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Outcome::Fatal(ApiError::Auth {
            status: status.as_u16(),
            body: error_body(response).await,
        });
    }

    if !status.is_success() {
        return Outcome::Fatal(ApiError::Http {
            status: status.as_u16(),
            body: error_body(response).await,
        });
    }

    // A body that cannot be read is a transport problem, not a bad payload.
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return Outcome::Transport(e.to_string()),
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Outcome::Success(value),
        Err(e) => Outcome::Fatal(ApiError::InvalidBody {
            message: e.to_string(),
            body: truncate_body(&text),
        }),
    }
}

/// Executes a GET-style request with retry logic, returning the JSON body.
///
/// `send` is invoked once per attempt and must build a fresh request each time.
pub(crate) async fn execute_with_retry<F, Fut>(
    config: &RetryConfig,
    url: &str,
    mut send: F,
) -> Result<Value>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = reqwest::Result<reqwest::Response>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = match send().await {
            Ok(response) => classify_response(response).await,
            Err(e) => Outcome::Transport(e.to_string()),
        };
        let exhausted = attempt >= max_attempts;

        let delay = match outcome {
            Outcome::Success(value) => return Ok(value),
            Outcome::Fatal(e) => return Err(e.into()),
            Outcome::Transport(message) => {
                if exhausted {
                    return Err(ApiError::Network {
                        attempts: attempt,
                        message,
                    }
                    .into());
                }
                let delay = config.backoff_for(attempt);
                warn!(url, attempt, delay_ms = delay.as_millis() as u64, error = %message, "transport failure, retrying");
                delay
            }
            Outcome::RateLimited { retry_after } => {
                if exhausted {
                    return Err(ApiError::RateLimit { attempts: attempt }.into());
                }
                let delay = rate_limit_delay(retry_after.as_deref());
                warn!(url, attempt, delay_ms = delay.as_millis() as u64, "rate limited (429), waiting");
                delay
            }
            Outcome::ServerError { status } => {
                if exhausted {
                    return Err(ApiError::Server {
                        status,
                        attempts: attempt,
                    }
                    .into());
                }
                let delay = config.backoff_for(attempt);
                warn!(url, attempt, status, delay_ms = delay.as_millis() as u64, "server error, retrying");
                delay
            }
        };

        sleep(delay).await;
    }
}
