//! Field catalogue and proposition formatting.

use owo_colors::OwoColorize;
use zendesk_harvest_rs::filter::{CatalogEntry, RangeKind};
use zendesk_harvest_rs::{FieldCatalog, Proposition};

/// Value shape and match mode for one catalogue entry.
fn entry_shape(entry: &CatalogEntry<'_>) -> (String, String, &'static str) {
    match entry {
        CatalogEntry::Expression(field) => (
            field.source().describe(),
            field.kind().describe().to_string(),
            field.match_kind().describe(),
        ),
        CatalogEntry::Range(range) => {
            let source = match range.kind() {
                RangeKind::Date { attribute } | RangeKind::Time { attribute } => attribute.clone(),
                RangeKind::CustomDatetime { id } => format!("custom_fields[{}]", id),
            };
            let (format, _) = range.kind().format();
            (source, format!("{0}..{0}", format), "range")
        }
    }
}

/// Formats every filterable field as a table.
pub fn format_fields_table(catalog: &FieldCatalog, use_colors: bool) -> String {
    let rows: Vec<(String, String, String, &'static str)> = catalog
        .entries()
        .map(|entry| {
            let (source, shape, mode) = entry_shape(&entry);
            (entry.key().to_string(), source, shape, mode)
        })
        .collect();

    let key_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max(5);
    let source_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max(6);
    let mode_width = 8;

    let mut output = String::new();
    let header = format!(
        "{:<key_width$}  {:<source_width$}  {:<mode_width$}  {}",
        "FIELD", "SOURCE", "MATCH", "VALUES"
    );
    if use_colors {
        output.push_str(&format!("{}\n", header.bold()));
    } else {
        output.push_str(&format!("{}\n", header));
    }

    for (key, source, shape, mode) in rows {
        let key = format!("{:<key_width$}", key);
        let key = if use_colors {
            key.cyan().to_string()
        } else {
            key
        };
        output.push_str(&format!(
            "{}  {:<source_width$}  {:<mode_width$}  {}\n",
            key, source, mode, shape
        ));
    }

    output
}

/// Formats the proposition line shown after every merge.
pub fn format_proposition(proposition: &Proposition, use_colors: bool) -> String {
    let text = proposition.to_string();
    if use_colors && !proposition.is_empty() {
        format!("Proposition: {}", text.yellow())
    } else {
        format!("Proposition: {}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zendesk_harvest_rs::{CustomFieldKind, CustomFieldSpec, MergeMode};

    #[test]
    fn test_fields_table_lists_every_entry() {
        let catalog = FieldCatalog::with_custom_fields(&[CustomFieldSpec {
            name: "analyst".to_string(),
            id: 900003000000,
            kind: CustomFieldKind::Dropdown,
        }]);
        let table = format_fields_table(&catalog, false);
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("FIELD"));
        assert_eq!(lines.len(), catalog.entries().count() + 1);
        assert!(table.contains("organization_id"));
        assert!(table.contains("YYYY-MM-DD..YYYY-MM-DD"));
        assert!(table
            .lines()
            .any(|l| l.starts_with("analyst") && l.contains("custom_fields[900003000000]")));
        assert!(table
            .lines()
            .any(|l| l.starts_with("tags") && l.contains("member")));
    }

    #[test]
    fn test_format_proposition() {
        let mut proposition = Proposition::new();
        assert_eq!(
            format_proposition(&proposition, false),
            "Proposition: (no filters)"
        );

        let catalog = FieldCatalog::standard();
        proposition.merge(
            catalog.compile("status", "open OR pending").unwrap(),
            MergeMode::Overwrite,
        );
        proposition.merge(
            catalog.compile("subject", "outage").unwrap(),
            MergeMode::Add(zendesk_harvest_rs::Combinator::And),
        );
        assert_eq!(
            format_proposition(&proposition, false),
            "Proposition: (open OR pending) AND (outage)"
        );
    }
}
