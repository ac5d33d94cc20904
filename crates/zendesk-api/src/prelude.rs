//! Prelude module for convenient imports.
//!
//! Re-exports the types a harvesting front end touches on every run, so a
//! single `use zendesk_api_rs::prelude::*;` is enough.
//!
//! # Example
//!
//! ```
//! use zendesk_api_rs::prelude::*;
//!
//! // Now you have access to:
//! // - ZendeskClient, ZendeskClientBuilder (API client)
//! // - Error, ApiError, Result (error handling)
//! // - Paginator, PageSource (page traversal)
//! // - Record, Role, CurrentUser (data models)
//! ```

// Client types
pub use crate::client::{ZendeskClient, ZendeskClientBuilder};

// Error types
pub use crate::error::{ApiError, Error, Result};

// Pagination
pub use crate::pagination::{next_page_link, PageSource, Paginator};

// Data models
pub use crate::models::{value_text, CurrentUser, Record, Role};

// Retry tuning
pub use crate::RetryConfig;
