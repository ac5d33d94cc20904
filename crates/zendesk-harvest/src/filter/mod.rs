//! Filter expressions for harvested tickets.
//!
//! Each filterable field accepts a small boolean language over its values:
//!
//! - values are any run of characters other than whitespace and parentheses
//! - `AND` / `OR` combine values (any case; `AND` binds tighter)
//! - `(` `)` group
//!
//! Input is normalized, tokenized, validated per field, compiled to
//! reverse-Polish form once, and evaluated per record with a stack.
//!
//! # Example
//!
//! ```
//! use zendesk_harvest_rs::filter::{compile, FieldCatalog};
//!
//! let expr = compile("open OR pending AND hold", true, |_| true).unwrap();
//! assert_eq!(expr.rpn_string(), "open pending hold AND OR");
//!
//! let catalog = FieldCatalog::standard();
//! let atom = catalog.compile("status", "open OR pending").unwrap();
//! assert_eq!(atom.description(), "(open OR pending)");
//! ```

mod compiler;
mod error;
mod evaluator;
mod field;
mod lexer;
mod range;

pub use compiler::{compile, to_rpn, CompiledExpression};
pub use error::{FilterError, FilterResult};
pub use evaluator::evaluate;
pub use field::{
    standard_fields, CustomFieldKind, FieldSource, FilterField, MatchKind, ValueKind,
    RESULT_TYPES, STATUSES,
};
pub use lexer::{normalize, tokenize, Lexer, Token};
pub use range::{standard_ranges, RangeField, RangeKind, RANGE_SEPARATOR};

use crate::proposition::Atom;

/// `--filter` entry that stands for the always-true atom.
pub const ALL_KEYWORD: &str = "all";

/// Largest edit distance for which an unknown field name gets a suggestion.
const MAX_FIELD_SUGGESTION_DISTANCE: usize = 3;

/// A custom field declared by configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldSpec {
    pub name: String,
    pub id: u64,
    pub kind: CustomFieldKind,
}

/// Either kind of filterable field.
#[derive(Debug, Clone, Copy)]
pub enum CatalogEntry<'a> {
    Expression(&'a FilterField),
    Range(&'a RangeField),
}

impl CatalogEntry<'_> {
    pub fn key(&self) -> &str {
        match self {
            CatalogEntry::Expression(field) => field.key(),
            CatalogEntry::Range(range) => range.key(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CatalogEntry::Expression(field) => field.label(),
            CatalogEntry::Range(range) => range.label(),
        }
    }

    /// Compiles a one-line entry: an expression, or `start..end` for ranges.
    pub fn compile(&self, input: &str) -> FilterResult<Atom> {
        match self {
            CatalogEntry::Expression(field) => field.compile(input),
            CatalogEntry::Range(range) => range.compile_expression(input),
        }
    }
}

/// Every field the operator can filter on.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<FilterField>,
    ranges: Vec<RangeField>,
}

impl FieldCatalog {
    /// The standard ticket attributes and timestamp ranges.
    pub fn standard() -> Self {
        Self {
            fields: standard_fields(),
            ranges: standard_ranges(),
        }
    }

    /// The standard catalogue plus configured custom fields.
    pub fn with_custom_fields(custom: &[CustomFieldSpec]) -> Self {
        let mut catalog = Self::standard();
        for spec in custom {
            catalog.add_custom(spec);
        }
        catalog
    }

    /// Adds a custom field, replacing any existing field with the same key.
    pub fn add_custom(&mut self, spec: &CustomFieldSpec) {
        self.fields.retain(|f| !f.key().eq_ignore_ascii_case(&spec.name));
        self.ranges.retain(|r| !r.key().eq_ignore_ascii_case(&spec.name));
        match FilterField::custom(&spec.name, spec.id, spec.kind) {
            Some(field) => self.fields.push(field),
            None => self.ranges.push(RangeField::custom(&spec.name, spec.id)),
        }
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn ranges(&self) -> &[RangeField] {
        &self.ranges
    }

    /// All entries, expression fields first, in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.fields
            .iter()
            .map(CatalogEntry::Expression)
            .chain(self.ranges.iter().map(CatalogEntry::Range))
    }

    /// Looks a field up by key, ignoring case.
    ///
    /// # Errors
    ///
    /// [`FilterError::UnknownField`] with the closest key when one is near.
    pub fn lookup(&self, name: &str) -> FilterResult<CatalogEntry<'_>> {
        let name = name.trim();
        if let Some(entry) = self
            .entries()
            .find(|entry| entry.key().eq_ignore_ascii_case(name))
        {
            return Ok(entry);
        }

        let lower = name.to_lowercase();
        let suggestion = self
            .entries()
            .map(|entry| {
                let distance = strsim::levenshtein(&lower, &entry.key().to_lowercase());
                (entry.key().to_string(), distance)
            })
            .filter(|(_, distance)| *distance <= MAX_FIELD_SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(key, _)| key);

        Err(FilterError::unknown_field(name, suggestion))
    }

    /// Looks up `name` and compiles a one-line entry for it.
    pub fn compile(&self, name: &str, input: &str) -> FilterResult<Atom> {
        self.lookup(name)?.compile(input)
    }

    /// Parses a `field=expression` entry.
    ///
    /// The bare keyword [`ALL_KEYWORD`] yields [`Atom::always`]. Any other
    /// entry without `=` names a field with an empty expression.
    pub fn compile_assignment(&self, entry: &str) -> FilterResult<Atom> {
        if entry.trim().eq_ignore_ascii_case(ALL_KEYWORD) {
            return Ok(Atom::always());
        }
        let (name, input) = entry.split_once('=').unwrap_or((entry, ""));
        self.compile(name, input)
    }
}

#[cfg(test)]
mod tests;
