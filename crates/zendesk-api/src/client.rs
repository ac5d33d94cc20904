//! HTTP client wrapper for the Zendesk API.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, Error, Result};
use crate::models::CurrentUser;
use crate::retry::{
    execute_with_retry, RetryConfig, DEFAULT_INITIAL_BACKOFF_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_BACKOFF_SECS,
};

/// Default request timeout shared by every call (30 seconds).
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default page size requested from listing and search endpoints.
pub(crate) const DEFAULT_PAGE_SIZE: u32 = 100;

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("ZenMaster/", env!("CARGO_PKG_VERSION"));

/// Endpoint returning the authenticated user.
const CURRENT_USER_ENDPOINT: &str = "/api/v2/users/me.json";

/// Client for interacting with the Zendesk API.
///
/// One client is one authenticated session: the underlying connection pool,
/// default headers, timeout and credentials are set up once and reused for
/// every request.
#[derive(Clone)]
pub struct ZendeskClient {
    http_client: reqwest::Client,
    base_url: String,
    auth_user: String,
    token: String,
    retry: RetryConfig,
    page_size: u32,
}

impl ZendeskClient {
    /// Creates a client for `https://{subdomain}.zendesk.com` with default settings.
    pub fn new(
        subdomain: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(subdomain, email, token).build()
    }

    /// Returns a builder for customizing timeouts, retries and the base URL.
    pub fn builder(
        subdomain: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> ZendeskClientBuilder {
        ZendeskClientBuilder::new(subdomain, email, token)
    }

    /// Returns the base URL (scheme and host, no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the basic-auth user name (`{email}/token`).
    pub fn auth_user(&self) -> &str {
        &self.auth_user
    }

    /// Returns the API token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns a reference to the underlying HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Returns the page size requested from paginated endpoints.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the total attempts allowed per request.
    pub fn max_attempts(&self) -> u32 {
        self.retry.max_attempts
    }

    /// Returns the backoff before the second attempt.
    pub fn initial_backoff(&self) -> Duration {
        self.retry.initial_backoff
    }

    /// Returns the exponential backoff ceiling.
    pub fn max_backoff(&self) -> Duration {
        self.retry.max_backoff
    }

    /// Calculates the backoff after a failed attempt (1-based).
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.retry.backoff_for(attempt)
    }

    /// Joins an endpoint path onto the base URL.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// First page of the ticket listing endpoint.
    pub fn tickets_url(&self) -> String {
        format!(
            "{}/api/v2/tickets.json?page[size]={}",
            self.base_url, self.page_size
        )
    }

    /// First page of the search endpoint for `query`.
    pub fn search_url(&self, query: &str) -> Result<String> {
        let page_size = self.page_size.to_string();
        let params = serde_urlencoded::to_string([("query", query), ("per_page", &page_size)])
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(format!("{}/api/v2/search.json?{}", self.base_url, params))
    }

    /// Performs an authenticated GET against an absolute URL.
    ///
    /// Transient failures are retried according to the client's
    /// [`RetryConfig`]; everything else is returned as an [`ApiError`].
    ///
    /// # Returns
    /// The parsed JSON body.
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        debug!(url, "GET");
        execute_with_retry(&self.retry, url, || {
            self.http_client
                .get(url)
                .basic_auth(&self.auth_user, Some(&self.token))
                .send()
        })
        .await
    }

    /// Fetches the authenticated user.
    ///
    /// # Errors
    /// Returns [`ApiError::UnexpectedShape`] if the response lacks a numeric `user.id`.
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let body = self.get_json(&self.url(CURRENT_USER_ENDPOINT)).await?;
        CurrentUser::from_envelope(&body).ok_or_else(|| {
            Error::Api(ApiError::UnexpectedShape {
                endpoint: "/users/me.json".to_string(),
                body: body.to_string(),
            })
        })
    }
}

impl fmt::Debug for ZendeskClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZendeskClient")
            .field("base_url", &self.base_url)
            .field("auth_user", &self.auth_user)
            .field("token", &"[REDACTED]")
            .field("retry", &self.retry)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Builder for [`ZendeskClient`].
#[derive(Debug, Clone)]
pub struct ZendeskClientBuilder {
    subdomain: String,
    email: String,
    token: String,
    base_url: Option<String>,
    retry: RetryConfig,
    request_timeout: Duration,
    page_size: u32,
}

impl ZendeskClientBuilder {
    /// Creates a builder with default timeout, retry and page size settings.
    pub fn new(
        subdomain: impl Into<String>,
        email: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            subdomain: subdomain.into(),
            email: email.into(),
            token: token.into(),
            base_url: None,
            retry: RetryConfig {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                initial_backoff: Duration::from_secs(DEFAULT_INITIAL_BACKOFF_SECS),
                max_backoff: Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS),
            },
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the base URL derived from the subdomain (used for testing).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the total attempts per request (at least 1).
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the backoff before the second attempt.
    pub fn initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.retry.initial_backoff = initial_backoff;
        self
    }

    /// Sets the exponential backoff ceiling.
    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.retry.max_backoff = max_backoff;
        self
    }

    /// Sets the timeout shared by every request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the page size requested from paginated endpoints.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    /// Returns [`Error::InvalidUrl`] if no base URL can be formed and
    /// [`Error::Http`] if the HTTP client cannot be initialised.
    pub fn build(self) -> Result<ZendeskClient> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => {
                let subdomain = self.subdomain.trim();
                if subdomain.is_empty()
                    || !subdomain
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    return Err(Error::InvalidUrl(format!(
                        "invalid Zendesk subdomain '{}'",
                        self.subdomain
                    )));
                }
                format!("https://{}.zendesk.com", subdomain)
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(ZendeskClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_user: format!("{}/token", self.email.trim()),
            token: self.token,
            retry: self.retry,
            page_size: self.page_size,
        })
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
