//! Zendesk API client library
//!
//! Provides the pieces the harvester needs from the remote ticketing API:
//! an authenticated client that retries transient failures, a paginator
//! that follows both cursor shapes the API returns, and a loosely-typed
//! [`Record`](models::Record) for ticket payloads.
//!
//! # Quick Start
//!
//! For convenient imports, use the prelude:
//!
//! ```
//! use zendesk_api_rs::prelude::*;
//! ```

pub mod client;
pub mod error;
pub mod models;
pub mod pagination;
pub mod prelude;
mod retry;

pub use retry::{rate_limit_delay, RetryConfig};
