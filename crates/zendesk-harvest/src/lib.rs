//! Ticket filtering and batched harvesting.
//!
//! This crate sits between the API client and the output writers:
//!
//! - [`filter`] compiles per-field boolean expressions into [`Atom`]s
//! - [`proposition`] accumulates atoms into the run's [`Proposition`]
//! - [`batch`] buffers records and hands filtered batches to a [`BatchSink`]
//! - [`harvester`] walks every role and drives the other three

pub mod batch;
pub mod filter;
pub mod harvester;
pub mod proposition;

pub use batch::{Batch, BatchAccumulator, BatchSink, MemorySink, OutputError, DEFAULT_BATCH_SIZE};
pub use filter::{CustomFieldKind, CustomFieldSpec, FieldCatalog, FilterError};
pub use harvester::{HarvestError, HarvestSummary, Harvester, RoleSummary};
pub use proposition::{Atom, Combinator, MergeMode, MergeOutcome, Proposition};
