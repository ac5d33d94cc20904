//! Tests for the filter pipeline as a whole.

use super::*;
use serde_json::json;
use zendesk_api_rs::models::Record;

fn accept_all(_: &str) -> bool {
    true
}

fn truth<'a>(values: &'a [(&'a str, bool)]) -> impl Fn(&str) -> bool + 'a {
    move |v| values.iter().any(|(name, b)| *name == v && *b)
}

fn ticket(value: serde_json::Value) -> Record {
    Record::from_value(value).unwrap()
}

// ==================== Compiler/Evaluator Laws ====================

#[test]
fn test_precedence_law() {
    let implicit = compile("a OR b AND c", false, accept_all).unwrap();
    let explicit = compile("a OR (b AND c)", false, accept_all).unwrap();
    assert_eq!(implicit.rpn(), explicit.rpn());

    for bits in 0..8u8 {
        let values = [("a", bits & 1 != 0), ("b", bits & 2 != 0), ("c", bits & 4 != 0)];
        assert_eq!(
            implicit.evaluate(truth(&values)),
            explicit.evaluate(truth(&values)),
            "assignment {bits:03b}"
        );
    }
}

#[test]
fn test_binary_truth_tables() {
    let and = compile("x AND y", false, accept_all).unwrap();
    let or = compile("x OR y", false, accept_all).unwrap();
    for (x, y) in [(false, false), (false, true), (true, false), (true, true)] {
        let values = [("x", x), ("y", y)];
        assert_eq!(and.evaluate(truth(&values)), x && y);
        assert_eq!(or.evaluate(truth(&values)), x || y);
    }
}

#[test]
fn test_well_nested_inputs_compile_to_non_empty_rpn() {
    for input in [
        "a",
        "(a)",
        "a AND b",
        "a OR b OR c",
        "(a OR b) AND (c OR d)",
        "((a AND b) OR c) AND d",
        "a and (b or (c and d))",
    ] {
        let compiled = compile(input, false, accept_all).unwrap();
        assert!(!compiled.rpn().is_empty(), "input: {input}");
    }
}

#[test]
fn test_unbalanced_parentheses_always_fail() {
    for input in [
        "(", ")", "(a", "a)", "(a OR b", "a OR b)", "((a)", "(a))", ")(", "a) AND (b",
    ] {
        assert_eq!(
            compile(input, false, accept_all),
            Err(FilterError::MismatchedParentheses),
            "input: {input}"
        );
    }
}

#[test]
fn test_lowercase_operators_compile_like_uppercase() {
    let lower = compile("a or b and c", false, accept_all).unwrap();
    let upper = compile("a OR b AND c", false, accept_all).unwrap();
    assert_eq!(lower.rpn(), upper.rpn());
    assert_eq!(lower.source(), "a or b and c");
}

// ==================== Catalogue ====================

#[test]
fn test_catalog_lookup_is_case_insensitive() {
    let catalog = FieldCatalog::standard();
    assert_eq!(catalog.lookup("STATUS").unwrap().key(), "status");
    assert_eq!(catalog.lookup(" created_at_date ").unwrap().key(), "created_at_date");
}

#[test]
fn test_catalog_unknown_field_suggests() {
    let catalog = FieldCatalog::standard();
    match catalog.lookup("stauts") {
        Err(FilterError::UnknownField { name, suggestion }) => {
            assert_eq!(name, "stauts");
            assert_eq!(suggestion.as_deref(), Some("status"));
        }
        other => panic!("Expected UnknownField, got: {:?}", other.map(|e| e.key().to_string())),
    }
    assert!(matches!(
        catalog.lookup("completely-unrelated"),
        Err(FilterError::UnknownField {
            suggestion: None,
            ..
        })
    ));
}

#[test]
fn test_compile_assignment() {
    let catalog = FieldCatalog::standard();
    let atom = catalog
        .compile_assignment("subject=outage OR incident")
        .unwrap();
    assert_eq!(atom.description(), "(outage OR incident)");
    assert!(atom.matches(&ticket(json!({"subject": "Major OUTAGE"}))));

    let range = catalog
        .compile_assignment("created_at_date=2025-01-01..2025-01-31")
        .unwrap();
    assert!(range.matches(&ticket(json!({"created_at": "2025-01-15T10:00:00Z"}))));

    assert_eq!(
        catalog.compile_assignment("status").unwrap_err(),
        FilterError::EmptyExpression
    );
}

#[test]
fn test_all_keyword_matches_everything() {
    let catalog = FieldCatalog::standard();
    for entry in ["all", " ALL "] {
        let atom = catalog.compile_assignment(entry).unwrap();
        assert_eq!(atom.description(), crate::proposition::ALL_TICKETS);
        assert!(atom.matches(&ticket(json!({}))));
        assert!(atom.matches(&ticket(json!({"status": "closed"}))));
    }
    assert!(matches!(
        catalog.compile_assignment("all=open"),
        Err(FilterError::UnknownField { .. })
    ));
}

#[test]
fn test_custom_fields_extend_catalog() {
    let catalog = FieldCatalog::with_custom_fields(&[
        CustomFieldSpec {
            name: "analyst".to_string(),
            id: 900003000000,
            kind: CustomFieldKind::Dropdown,
        },
        CustomFieldSpec {
            name: "initial-response".to_string(),
            id: 900012000000,
            kind: CustomFieldKind::Datetime,
        },
    ]);

    assert!(matches!(
        catalog.lookup("analyst"),
        Ok(CatalogEntry::Expression(_))
    ));
    assert!(matches!(
        catalog.lookup("initial-response"),
        Ok(CatalogEntry::Range(_))
    ));

    let atom = catalog
        .compile(
            "initial-response",
            "2025/09/10 07:00 AM..2025/09/10 09:00 AM",
        )
        .unwrap();
    let t = ticket(json!({"custom_fields": [{"id": 900012000000u64, "value": "2025/09/10 08:15 AM"}]}));
    assert!(atom.matches(&t));
}

#[test]
fn test_custom_field_replaces_same_key() {
    let mut catalog = FieldCatalog::standard();
    let before = catalog.entries().count();
    catalog.add_custom(&CustomFieldSpec {
        name: "site".to_string(),
        id: 1,
        kind: CustomFieldKind::Dropdown,
    });
    catalog.add_custom(&CustomFieldSpec {
        name: "Site".to_string(),
        id: 2,
        kind: CustomFieldKind::Contains,
    });
    assert_eq!(catalog.entries().count(), before + 1);
    match catalog.lookup("site").unwrap() {
        CatalogEntry::Expression(field) => {
            assert_eq!(field.source(), &FieldSource::Custom(2));
            assert_eq!(field.match_kind(), MatchKind::Contains);
        }
        CatalogEntry::Range(_) => panic!("expected an expression field"),
    }
}

#[test]
fn test_every_standard_entry_has_distinct_key() {
    let catalog = FieldCatalog::standard();
    let mut keys: Vec<String> = catalog.entries().map(|e| e.key().to_string()).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total);
}
