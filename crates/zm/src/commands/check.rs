//! Check command implementation.
//!
//! Compiles one filter expression without contacting Zendesk and shows the
//! normalized source and its postfix (RPN) form, or the validation error.

use owo_colors::OwoColorize;
use zendesk_harvest_rs::filter::{compile, CatalogEntry};
use zendesk_harvest_rs::FieldCatalog;

use super::{CommandContext, Result};

/// Result of checking one expression.
#[derive(Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub field: String,
    pub description: String,
    /// Postfix form; absent for range fields.
    pub rpn: Option<String>,
}

/// Compiles `expression` for `field` against `catalog`.
///
/// # Errors
///
/// The field-specific [`FilterError`](zendesk_harvest_rs::FilterError).
pub fn check(catalog: &FieldCatalog, field: &str, expression: &str) -> Result<CheckReport> {
    let entry = catalog.lookup(field)?;
    let atom = entry.compile(expression)?;

    let rpn = match entry {
        CatalogEntry::Expression(field) => {
            let kind = field.kind();
            let compiled = compile(expression, kind.folds_case(), |v| kind.is_valid(v))?;
            Some(compiled.rpn_string())
        }
        CatalogEntry::Range(_) => None,
    };

    Ok(CheckReport {
        field: entry.key().to_string(),
        description: atom.description().to_string(),
        rpn,
    })
}

/// Executes the check command.
pub fn execute(ctx: &CommandContext, field: &str, expression: &str) -> Result<()> {
    let catalog = super::fields::catalog()?;
    let report = check(&catalog, field, expression)?;

    if ctx.quiet {
        return Ok(());
    }
    if ctx.use_colors {
        println!("{} {}", report.field.cyan(), report.description);
    } else {
        println!("{} {}", report.field, report.description);
    }
    if let Some(rpn) = report.rpn {
        println!("RPN: {}", rpn);
    }
    Ok(())
}
