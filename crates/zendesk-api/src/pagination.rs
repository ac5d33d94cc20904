//! Page-by-page traversal of listing and search endpoints.
//!
//! Zendesk exposes two cursor shapes: cursor-paginated endpoints return a
//! nested `links.next`, offset-paginated ones (search) return a flat
//! `next_page`. Both are checked on every page, nested form first.

use serde_json::Value;
use tracing::debug;

use crate::client::ZendeskClient;
use crate::error::Result;
use crate::models::{Record, Role};

/// Search hits of any other type are skipped.
const TICKET_RESULT_TYPE: &str = "ticket";

/// Which endpoint family a paginator walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// `/api/v2/tickets.json`: records under `tickets`.
    Tickets,
    /// `/api/v2/search.json`: hits under `results`, filtered by `result_type`.
    Search,
}

impl PageSource {
    /// The envelope key holding the page's records.
    pub fn records_key(&self) -> &'static str {
        match self {
            PageSource::Tickets => "tickets",
            PageSource::Search => "results",
        }
    }

    /// Returns true if an item from this source should be harvested.
    pub fn keeps(&self, item: &Value) -> bool {
        match self {
            PageSource::Tickets => true,
            PageSource::Search => {
                item.get("result_type").and_then(Value::as_str) == Some(TICKET_RESULT_TYPE)
            }
        }
    }
}

/// Returns the URL of the next page, if the response names one.
///
/// `links.next` wins over `next_page`; null and empty strings count as absent.
pub fn next_page_link(body: &Value) -> Option<String> {
    let nested = body
        .get("links")
        .and_then(|links| links.get("next"))
        .and_then(Value::as_str);
    let flat = body.get("next_page").and_then(Value::as_str);

    nested
        .filter(|url| !url.is_empty())
        .or_else(|| flat.filter(|url| !url.is_empty()))
        .map(str::to_string)
}

/// Pulls the records out of one page and stamps each with `role`.
///
/// Items that are not JSON objects, or that the source does not keep, are
/// dropped. A page without the records key yields nothing.
pub fn extract_records(body: &Value, source: PageSource, role: Role) -> Vec<Record> {
    let Some(items) = body.get(source.records_key()).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|item| source.keeps(item))
        .filter_map(|item| Record::from_value(item.clone()))
        .map(|mut record| {
            record.stamp_role(role);
            record
        })
        .collect()
}

/// Walks one role's result set a page at a time.
///
/// Pages are fetched lazily: nothing is requested until [`Paginator::next_page`]
/// is awaited, so the caller can flush batches between pages.
#[derive(Debug)]
pub struct Paginator<'a> {
    client: &'a ZendeskClient,
    source: PageSource,
    role: Role,
    next_url: Option<String>,
    pages_fetched: u32,
}

impl<'a> Paginator<'a> {
    /// Creates a paginator starting at `start_url`.
    pub fn new(
        client: &'a ZendeskClient,
        source: PageSource,
        role: Role,
        start_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source,
            role,
            next_url: Some(start_url.into()),
            pages_fetched: 0,
        }
    }

    /// Creates the paginator serving `role` for the agent `user_id`.
    ///
    /// `Assigned` walks the ticket listing; every other role runs a search.
    pub fn for_role(client: &'a ZendeskClient, role: Role, user_id: u64) -> Result<Self> {
        match role.search_query(user_id) {
            None => Ok(Self::new(client, PageSource::Tickets, role, client.tickets_url())),
            Some(query) => {
                let url = client.search_url(&query)?;
                Ok(Self::new(client, PageSource::Search, role, url))
            }
        }
    }

    /// Fetches the next page.
    ///
    /// Returns `Ok(None)` once no further page is referenced. A page whose
    /// items were all filtered out yields `Ok(Some(vec![]))` and traversal
    /// continues.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Record>>> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        let body = self.client.get_json(&url).await?;
        self.pages_fetched += 1;
        self.next_url = next_page_link(&body);

        let records = extract_records(&body, self.source, self.role);
        debug!(
            role = %self.role,
            page = self.pages_fetched,
            records = records.len(),
            has_next = self.next_url.is_some(),
            "fetched page"
        );
        Ok(Some(records))
    }

    /// Returns true once the last page has been fetched.
    pub fn is_exhausted(&self) -> bool {
        self.next_url.is_none()
    }

    /// Number of pages fetched so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// The role stamped on every record this paginator yields.
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn source(&self) -> PageSource {
        self.source
    }
}
