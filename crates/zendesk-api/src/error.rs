//! Error types for the Zendesk API client.

use std::fmt;

/// Longest raw body kept for a diagnostic, in characters.
pub const MAX_BODY_CHARS: usize = 2000;

/// Truncates a raw response body for inclusion in an error.
pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_CHARS) {
        Some((end, _)) => format!("{}...", &body[..end]),
        None => body.to_string(),
    }
}

/// Errors reported by the Zendesk API or the transport underneath it.
///
/// Every variant is terminal for the current run: transient conditions are
/// retried inside the client and only surface here once retries run out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Connection or timeout failures that persisted through every attempt.
    Network { attempts: u32, message: String },
    /// HTTP 429 on every attempt.
    RateLimit { attempts: u32 },
    /// HTTP 5xx on every attempt.
    Server { status: u16, attempts: u32 },
    /// HTTP 401/403. Never retried.
    Auth { status: u16, body: Option<String> },
    /// Any other non-success status.
    Http { status: u16, body: Option<String> },
    /// A 2xx response whose body is not JSON. `body` is the raw text,
    /// truncated to [`MAX_BODY_CHARS`].
    InvalidBody { message: String, body: String },
    /// JSON that does not have the shape an endpoint promises.
    UnexpectedShape { endpoint: String, body: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network { message, .. } => {
                write!(f, "Network error contacting Zendesk: {}", message)
            }
            ApiError::RateLimit { .. } => {
                write!(f, "Rate limited by Zendesk too many times (429).")
            }
            ApiError::Server { status, .. } => write!(f, "Zendesk server error {}.", status),
            ApiError::Auth { status, body } => {
                write!(
                    f,
                    "Authentication/authorization failed ({}). Check ZENDESK_SUBDOMAIN / ZENDESK_EMAIL / ZENDESK_API_TOKEN.",
                    status
                )?;
                write_body(f, body.as_deref())
            }
            ApiError::Http { status, body } => {
                write!(f, "HTTP error from Zendesk: {}", status)?;
                write_body(f, body.as_deref())
            }
            ApiError::InvalidBody { body, .. } => {
                write!(f, "Invalid JSON received from Zendesk.")?;
                write_body(f, Some(body))
            }
            ApiError::UnexpectedShape { endpoint, body } => {
                write!(f, "Unexpected response from {}", endpoint)?;
                write_body(f, Some(body))
            }
        }
    }
}

/// Appends the raw response body on its own line when there is one.
fn write_body(f: &mut fmt::Formatter<'_>, body: Option<&str>) -> fmt::Result {
    match body {
        Some(body) if !body.trim().is_empty() => write!(f, "\n{}", body.trim()),
        _ => Ok(()),
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// Returns true for conditions that were transient before retries ran out.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network { .. } | ApiError::RateLimit { .. } | ApiError::Server { .. }
        )
    }

    /// Returns the appropriate CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ApiError::Network { .. } => 3,
            ApiError::RateLimit { .. } => 4,
            _ => 2,
        }
    }
}

/// Top-level error type for the client crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A classified API failure.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// The HTTP client itself could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// A URL could not be assembled from the configured subdomain or query.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Returns the appropriate CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Api(e) => e.exit_code(),
            Error::Http(_) | Error::InvalidUrl(_) => 2,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
