//! Harvest orchestration.
//!
//! The [`Harvester`] owns everything a run mutates: the frozen
//! [`Proposition`], the [`BatchAccumulator`] and the running counters. It
//! walks each role in [`Role::ALL`] order, feeding every record through the
//! accumulator, and flushes the remainder once all roles are done.
//!
//! # Example
//!
//! ```no_run
//! use zendesk_api_rs::client::ZendeskClient;
//! use zendesk_harvest_rs::{Harvester, MemorySink, Proposition};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ZendeskClient::new("acme", "agent@acme.com", "token")?;
//!     let mut harvester = Harvester::new(&client, Proposition::new(), 100);
//!     let mut sink = MemorySink::new();
//!
//!     let summary = harvester.run(&mut sink).await?;
//!     println!("Total tickets written across batches: {}", summary.total_written);
//!     Ok(())
//! }
//! ```

use tracing::info;
use zendesk_api_rs::client::ZendeskClient;
use zendesk_api_rs::models::Role;
use zendesk_api_rs::pagination::Paginator;

use crate::batch::{BatchAccumulator, BatchSink, OutputError};
use crate::proposition::Proposition;

/// Exit code for output failures.
const OUTPUT_EXIT_CODE: i32 = 3;

/// Errors that end a harvest run.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Fetching from Zendesk failed after retries, or was not retryable.
    #[error("{0}")]
    Api(#[from] zendesk_api_rs::error::Error),

    /// Writing a batch failed.
    #[error("{0}")]
    Output(#[from] OutputError),
}

impl HarvestError {
    /// Returns the appropriate CLI exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            HarvestError::Api(e) => e.exit_code(),
            HarvestError::Output(_) => OUTPUT_EXIT_CODE,
        }
    }
}

/// Result type for harvest operations.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Per-role traversal counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSummary {
    pub role: Role,
    pub pages: u32,
    pub records: usize,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSummary {
    /// The authenticated agent's id.
    pub user_id: u64,
    /// One entry per role, in harvest order.
    pub roles: Vec<RoleSummary>,
    /// Flushes performed, including ones with no survivors.
    pub batches: u32,
    /// Records that passed the filter and were written.
    pub total_written: usize,
}

impl HarvestSummary {
    /// Records fetched across every role, before filtering.
    pub fn total_scanned(&self) -> usize {
        self.roles.iter().map(|r| r.records).sum()
    }
}

/// Drives one harvest run.
///
/// Everything is awaited in sequence: one page request at a time, each page
/// fully pushed through the accumulator before the next is requested.
pub struct Harvester<'a> {
    client: &'a ZendeskClient,
    proposition: Proposition,
    accumulator: BatchAccumulator,
    roles: Vec<Role>,
}

impl<'a> Harvester<'a> {
    /// Creates a harvester flushing every `batch_size` records.
    pub fn new(client: &'a ZendeskClient, proposition: Proposition, batch_size: usize) -> Self {
        Self {
            client,
            proposition,
            accumulator: BatchAccumulator::new(batch_size),
            roles: Role::ALL.to_vec(),
        }
    }

    /// Restricts the run to `roles`, kept in [`Role::ALL`] order.
    pub fn with_roles(mut self, roles: &[Role]) -> Self {
        self.roles = Role::ALL
            .into_iter()
            .filter(|role| roles.contains(role))
            .collect();
        self
    }

    pub fn proposition(&self) -> &Proposition {
        &self.proposition
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn batch_size(&self) -> usize {
        self.accumulator.threshold()
    }

    /// Runs the harvest to completion, writing batches to `sink`.
    ///
    /// # Errors
    ///
    /// Any API or output failure aborts the run; batches already written
    /// stay written.
    pub async fn run<S>(&mut self, sink: &mut S) -> Result<HarvestSummary>
    where
        S: BatchSink + ?Sized,
    {
        let user = self.client.current_user().await?;
        info!(user_id = user.id, filter = %self.proposition, "starting harvest");

        let mut roles = Vec::with_capacity(self.roles.len());
        for role in self.roles.clone() {
            let summary = self.harvest_role(role, user.id, sink).await?;
            roles.push(summary);
        }

        self.accumulator.finish(&self.proposition, sink)?;

        let summary = HarvestSummary {
            user_id: user.id,
            roles,
            batches: self.accumulator.batches_flushed(),
            total_written: self.accumulator.total_written(),
        };
        info!(
            batches = summary.batches,
            scanned = summary.total_scanned(),
            written = summary.total_written,
            "harvest complete"
        );
        Ok(summary)
    }

    async fn harvest_role<S>(&mut self, role: Role, user_id: u64, sink: &mut S) -> Result<RoleSummary>
    where
        S: BatchSink + ?Sized,
    {
        let mut paginator = Paginator::for_role(self.client, role, user_id)?;
        let mut records = 0;

        while let Some(page) = paginator.next_page().await? {
            records += page.len();
            for record in page {
                self.accumulator.push(record, &self.proposition, sink)?;
            }
        }

        info!(%role, pages = paginator.pages_fetched(), records, "role harvested");
        Ok(RoleSummary {
            role,
            pages: paginator.pages_fetched(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_with_roles_keeps_harvest_order() {
        let client = ZendeskClient::new("acme", "a@b.com", "t").unwrap();
        let harvester = Harvester::new(&client, Proposition::new(), 10)
            .with_roles(&[Role::Requester, Role::Assigned]);
        assert_eq!(harvester.roles(), &[Role::Assigned, Role::Requester]);
        assert_eq!(harvester.batch_size(), 10);
    }

    #[test]
    fn test_default_roles_are_all() {
        let client = ZendeskClient::new("acme", "a@b.com", "t").unwrap();
        let harvester = Harvester::new(&client, Proposition::new(), 0);
        assert_eq!(harvester.roles(), &Role::ALL);
        assert_eq!(harvester.batch_size(), 1);
        assert!(harvester.proposition().is_empty());
    }

    #[test]
    fn test_exit_codes() {
        let output = HarvestError::Output(OutputError::io(
            PathBuf::from("out.csv"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        ));
        assert_eq!(output.exit_code(), 3);

        let api = HarvestError::Api(zendesk_api_rs::error::Error::Api(
            zendesk_api_rs::error::ApiError::RateLimit { attempts: 6 },
        ));
        assert_eq!(api.exit_code(), 4);
        assert_eq!(api.to_string(), "Rate limited by Zendesk too many times (429).");
    }

    #[test]
    fn test_summary_total_scanned() {
        let summary = HarvestSummary {
            user_id: 1,
            roles: vec![
                RoleSummary {
                    role: Role::Assigned,
                    pages: 2,
                    records: 150,
                },
                RoleSummary {
                    role: Role::Cc,
                    pages: 1,
                    records: 3,
                },
            ],
            batches: 2,
            total_written: 120,
        };
        assert_eq!(summary.total_scanned(), 153);
    }
}
