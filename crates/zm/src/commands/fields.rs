//! Fields command implementation.
//!
//! Lists every filterable field, including configured custom fields.

use zendesk_harvest_rs::FieldCatalog;

use super::config::load_config;
use super::{CommandContext, Result};
use crate::output::format_fields_table;

/// Builds the catalogue for this run: standard fields plus configured custom fields.
pub fn catalog() -> Result<FieldCatalog> {
    let config = load_config()?;
    Ok(FieldCatalog::with_custom_fields(&config.custom_field_specs()))
}

/// Executes the fields command.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let catalog = catalog()?;
    if !ctx.quiet {
        print!("{}", format_fields_table(&catalog, ctx.use_colors));
    }
    Ok(())
}
