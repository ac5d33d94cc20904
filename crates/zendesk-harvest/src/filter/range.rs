//! Range predicates over timestamps.
//!
//! Ticket timestamps are ISO-8601 strings such as `2025-07-31T02:52:31Z`.
//! Date ranges compare the part before `T`, time ranges the part after it,
//! both as plain strings (the fixed-width formats make that an ordering).
//! Custom datetime fields use `YYYY/MM/DD HH:MM AM/PM` and are parsed.

use chrono::NaiveDateTime;
use zendesk_api_rs::models::Record;

use super::error::{FilterError, FilterResult};
use crate::proposition::Atom;

/// Separator between bounds in a one-line range expression.
pub const RANGE_SEPARATOR: &str = "..";

const CUSTOM_DATETIME_FORMAT: &str = "%Y/%m/%d %I:%M %p";

/// Which part of a value a range compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeKind {
    /// `YYYY-MM-DD` against the date part of a timestamp attribute.
    Date { attribute: String },
    /// `HH:MM:SSZ` against the time part of a timestamp attribute.
    Time { attribute: String },
    /// `YYYY/MM/DD HH:MM AM/PM` against a custom field.
    CustomDatetime { id: u64 },
}

impl RangeKind {
    /// Accepted bound shape and an example, as shown to the user.
    pub fn format(&self) -> (&'static str, &'static str) {
        match self {
            RangeKind::Date { .. } => ("YYYY-MM-DD", "2025-07-31"),
            RangeKind::Time { .. } => ("HH:MM:SSZ", "02:52:31Z"),
            RangeKind::CustomDatetime { .. } => ("YYYY/MM/DD HH:MM AM/PM", "2025/09/10 07:45 PM"),
        }
    }

    fn accepts(&self, bound: &str) -> bool {
        match self {
            RangeKind::Date { .. } => has_shape(bound, "####-##-##"),
            RangeKind::Time { .. } => has_shape(bound, "##:##:##Z"),
            RangeKind::CustomDatetime { .. } => {
                (has_shape(bound, "####/##/## ##:## AM") || has_shape(bound, "####/##/## ##:## PM"))
                    && parse_custom_datetime(bound).is_some()
            }
        }
    }
}

/// Matches `value` against `pattern`, where `#` stands for any ASCII digit.
fn has_shape(value: &str, pattern: &str) -> bool {
    value.len() == pattern.len()
        && value
            .bytes()
            .zip(pattern.bytes())
            .all(|(v, p)| if p == b'#' { v.is_ascii_digit() } else { v == p })
}

fn parse_custom_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), CUSTOM_DATETIME_FORMAT).ok()
}

/// A field filtered by an inclusive range rather than an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeField {
    key: String,
    label: String,
    kind: RangeKind,
}

impl RangeField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: RangeKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
        }
    }

    /// Date range over a timestamp attribute, keyed `<attribute>_date`.
    pub fn date(attribute: &str) -> Self {
        Self::new(
            format!("{}_date", attribute),
            format!("{} date range filter", capitalize(attribute)),
            RangeKind::Date {
                attribute: attribute.to_string(),
            },
        )
    }

    /// Time-of-day range over a timestamp attribute, keyed `<attribute>_time`.
    pub fn time(attribute: &str) -> Self {
        Self::new(
            format!("{}_time", attribute),
            format!("{} time range filter", capitalize(attribute)),
            RangeKind::Time {
                attribute: attribute.to_string(),
            },
        )
    }

    /// Datetime range over a custom field.
    pub fn custom(name: &str, id: u64) -> Self {
        Self::new(name, name, RangeKind::CustomDatetime { id })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &RangeKind {
        &self.kind
    }

    /// Checks a single bound, for prompting one bound at a time.
    pub fn validate_bound(&self, bound: &str) -> FilterResult<()> {
        if self.kind.accepts(bound.trim()) {
            Ok(())
        } else {
            let (expected, example) = self.kind.format();
            Err(FilterError::invalid_range(expected, example))
        }
    }

    /// Compiles an inclusive `[start, end]` range into an atom.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidRange`] for a malformed bound and
    /// [`FilterError::RangeStartAfterEnd`] when `start > end`.
    pub fn compile(&self, start: &str, end: &str) -> FilterResult<Atom> {
        let (start, end) = (start.trim(), end.trim());
        self.validate_bound(start)?;
        self.validate_bound(end)?;

        let name = match &self.kind {
            RangeKind::Date { attribute } => format!("{}_date", attribute),
            RangeKind::Time { attribute } => format!("{}_time", attribute),
            RangeKind::CustomDatetime { .. } => self.label.clone(),
        };
        let description = format!("({} between \"{}\" and \"{}\")", name, start, end);

        match &self.kind {
            RangeKind::Date { attribute } | RangeKind::Time { attribute } => {
                if start > end {
                    return Err(FilterError::RangeStartAfterEnd);
                }
                let attribute = attribute.clone();
                let want_date = matches!(self.kind, RangeKind::Date { .. });
                let (start, end) = (start.to_string(), end.to_string());
                Ok(Atom::new(description, move |record: &Record| {
                    let Some((date, time)) = record
                        .str_field(&attribute)
                        .and_then(|ts| ts.split_once('T'))
                    else {
                        return false;
                    };
                    let part = if want_date { date } else { time };
                    start.as_str() <= part && part <= end.as_str()
                }))
            }
            RangeKind::CustomDatetime { id } => {
                let (Some(from), Some(to)) = (parse_custom_datetime(start), parse_custom_datetime(end))
                else {
                    let (expected, example) = self.kind.format();
                    return Err(FilterError::invalid_range(expected, example));
                };
                if from > to {
                    return Err(FilterError::RangeStartAfterEnd);
                }
                let id = *id;
                Ok(Atom::new(description, move |record: &Record| {
                    parse_custom_datetime(&record.custom_text(id))
                        .is_some_and(|value| from <= value && value <= to)
                }))
            }
        }
    }

    /// Compiles a one-line `start..end` expression.
    pub fn compile_expression(&self, expression: &str) -> FilterResult<Atom> {
        match expression.split_once(RANGE_SEPARATOR) {
            Some((start, end)) => self.compile(start, end),
            None => {
                let (expected, example) = self.kind.format();
                Err(FilterError::invalid_range(
                    format!("{expected}{RANGE_SEPARATOR}{expected}"),
                    format!("{example}{RANGE_SEPARATOR}{example}"),
                ))
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Date and time ranges over the standard timestamp attributes.
pub fn standard_ranges() -> Vec<RangeField> {
    ["created_at", "updated_at", "due_at"]
        .into_iter()
        .flat_map(|attribute| [RangeField::date(attribute), RangeField::time(attribute)])
        .collect()
}
