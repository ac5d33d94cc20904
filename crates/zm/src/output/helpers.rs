//! Common helpers for batch file output.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;
use zendesk_api_rs::models::{value_text, Record};

/// Prefix of every batch file name.
const FILE_PREFIX: &str = "zendesk_tickets";

/// Formats the per-run UTC stamp embedded in file names.
pub fn file_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Name of a batch file, e.g. `zendesk_tickets_2025-07-31_02-52-31_batch_00001.csv`.
pub fn batch_file_name(stamp: &str, index: u32, extension: &str) -> String {
    format!("{FILE_PREFIX}_{stamp}_batch_{index:05}.{extension}")
}

/// Renders a field for a CSV cell or env value.
///
/// Absent and null are empty, nested values stay JSON, and line breaks in
/// strings become spaces so each record stays on one line.
pub fn cell_value(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::String(s)) => s.replace(['\r', '\n'], " "),
        Some(other) => value_text(other),
    }
}

/// Numeric sort key for a record's id; missing or non-numeric ids sort as 0.
fn id_key(record: &Record) -> i64 {
    record.get("id").and_then(Value::as_i64).unwrap_or(0)
}

/// Records ordered by id. The sort is stable.
pub fn sorted_by_id(records: &[Record]) -> Vec<&Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by_key(|r| id_key(r));
    sorted
}

/// Sorted union of public field names across `records`, with `id` first.
pub fn column_names<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    let names: BTreeSet<&str> = records
        .into_iter()
        .flat_map(|r| r.public_fields().map(|(k, _)| k.as_str()))
        .filter(|k| *k != "id")
        .collect();
    std::iter::once("id")
        .chain(names)
        .map(str::to_string)
        .collect()
}

/// Env variable name for one ticket field: `TICKET_<id>_<FIELD>`.
///
/// Characters other than ASCII letters and digits become `_`.
pub fn env_var_name(id: &str, field: &str) -> String {
    let field: String = field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("TICKET_{}_{}", id, field)
}
