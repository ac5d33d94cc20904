//! Output for the zm CLI.
//!
//! - [`files`] - per-batch CSV and ticket-variable files
//! - [`helpers`] - cell rendering, column selection and file naming
//! - [`fields`] - the `zm fields` table and proposition display

mod fields;
mod files;
pub mod helpers;

pub use fields::{format_fields_table, format_proposition};
pub use files::BatchFileWriter;
