//! Data types for Zendesk payloads.
//!
//! Ticket payloads are kept loosely typed: the harvester only needs
//! get-or-default field access, so a [`Record`] wraps the raw JSON object
//! instead of mirroring the full ticket schema.

mod record;
mod role;
mod user;

pub use record::*;
pub use role::*;
pub use user::*;
