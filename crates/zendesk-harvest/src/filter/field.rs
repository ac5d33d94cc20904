//! Filterable ticket attributes.
//!
//! A [`FilterField`] ties a value validator, a case-fold policy and a match
//! mode to one place in the ticket payload. Every field funnels through the
//! same compiler and produces the same kind of [`Atom`].

use serde::{Deserialize, Serialize};
use zendesk_api_rs::models::Record;

use super::compiler::compile;
use super::error::{FilterError, FilterResult};
use crate::proposition::Atom;

/// Accepted ticket statuses.
pub const STATUSES: &[&str] = &["new", "open", "pending", "hold", "solved", "closed"];

/// Accepted search result types.
pub const RESULT_TYPES: &[&str] = &[
    "ticket",
    "user",
    "organization",
    "group",
    "comment",
    "article",
    "entry",
];

/// Largest Levenshtein distance for which a suggestion is offered.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// The shape a value token must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// One or more ASCII digits.
    Digits,
    /// Exactly 14 digits.
    OrganizationId,
    /// `local@domain.tld`, 1 to 254 characters.
    Email,
    /// One of [`STATUSES`].
    Status,
    /// One of [`RESULT_TYPES`].
    ResultType,
    /// 1 to 100 characters.
    Token,
    /// 1 to 200 characters.
    Text,
    /// Dotted quad, each part 0 to 255.
    Ipv4,
    /// MD5, SHA-1 or SHA-256 hex digest.
    Hash,
}

impl ValueKind {
    /// Returns true if `value` (already case-folded when applicable) is acceptable.
    pub fn is_valid(&self, value: &str) -> bool {
        let len = value.chars().count();
        match self {
            ValueKind::Digits => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            ValueKind::OrganizationId => len == 14 && value.bytes().all(|b| b.is_ascii_digit()),
            ValueKind::Email => (1..=254).contains(&len) && is_email(value),
            ValueKind::Status => STATUSES.contains(&value.to_lowercase().as_str()),
            ValueKind::ResultType => RESULT_TYPES.contains(&value.to_lowercase().as_str()),
            ValueKind::Token => (1..=100).contains(&len),
            ValueKind::Text => (1..=200).contains(&len),
            ValueKind::Ipv4 => is_ipv4(value),
            ValueKind::Hash => {
                matches!(value.len(), 32 | 40 | 64) && value.bytes().all(|b| b.is_ascii_hexdigit())
            }
        }
    }

    /// Whether values of this kind are compared case-insensitively.
    pub fn folds_case(&self) -> bool {
        !matches!(
            self,
            ValueKind::Digits | ValueKind::OrganizationId | ValueKind::Ipv4
        )
    }

    /// The closed set of accepted values, if there is one.
    pub fn vocabulary(&self) -> Option<&'static [&'static str]> {
        match self {
            ValueKind::Status => Some(STATUSES),
            ValueKind::ResultType => Some(RESULT_TYPES),
            _ => None,
        }
    }

    /// Short human description of the accepted shape.
    pub fn describe(&self) -> &'static str {
        match self {
            ValueKind::Digits => "digits",
            ValueKind::OrganizationId => "14 digits",
            ValueKind::Email => "email",
            ValueKind::Status => "new|open|pending|hold|solved|closed",
            ValueKind::ResultType => "ticket|user|organization|group|comment|article|entry",
            ValueKind::Token => "1-100 chars",
            ValueKind::Text => "1-200 chars",
            ValueKind::Ipv4 => "IPv4",
            ValueKind::Hash => "MD5/SHA1/SHA256 hex",
        }
    }

    /// Suggests the closest vocabulary entry for a rejected value.
    pub fn suggest(&self, value: &str) -> Option<String> {
        let vocabulary = self.vocabulary()?;
        let lower = value.to_lowercase();
        vocabulary
            .iter()
            .map(|candidate| (candidate, strsim::levenshtein(&lower, candidate)))
            .filter(|(_, distance)| *distance <= MAX_SUGGESTION_DISTANCE)
            .min_by_key(|(_, distance)| *distance)
            .map(|(candidate, _)| candidate.to_string())
    }
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Dotted quad. Three-digit parts must not exceed 255; shorter parts may
/// carry a leading zero.
fn is_ipv4(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|part| {
            let digits = part.bytes().all(|b| b.is_ascii_digit());
            match part.len() {
                1 | 2 => digits,
                3 => {
                    digits
                        && matches!(part.as_bytes()[0], b'1' | b'2')
                        && part.parse::<u16>().is_ok_and(|n| n <= 255)
                }
                _ => false,
            }
        })
}

/// How a record's value is compared with each expression value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Whole-value equality.
    Equals,
    /// The expression value occurs inside the record value.
    Contains,
    /// The expression value is one of a list (tags).
    Member,
}

impl MatchKind {
    pub fn describe(&self) -> &'static str {
        match self {
            MatchKind::Equals => "exact",
            MatchKind::Contains => "contains",
            MatchKind::Member => "member",
        }
    }
}

/// Where in the ticket a field's value lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// A top-level ticket attribute.
    Attribute(String),
    /// A custom field, looked up by numeric id.
    Custom(u64),
    /// The ticket's tag list.
    Tags,
}

impl FieldSource {
    /// Human-readable location, e.g. `status` or `custom_fields[900003000000]`.
    pub fn describe(&self) -> String {
        match self {
            FieldSource::Attribute(name) => name.clone(),
            FieldSource::Custom(id) => format!("custom_fields[{}]", id),
            FieldSource::Tags => "tags".to_string(),
        }
    }
}

/// Kinds of custom field that can be declared in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomFieldKind {
    /// Drop-down: exact, case-insensitive.
    Dropdown,
    /// Free text: case-insensitive substring.
    Contains,
    /// IPv4 address: exact.
    Ipv4,
    /// File hash: exact, case-insensitive.
    Hash,
    /// `YYYY/MM/DD HH:MM AM/PM` timestamp: range.
    Datetime,
}

impl std::str::FromStr for CustomFieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dropdown" => Ok(CustomFieldKind::Dropdown),
            "contains" => Ok(CustomFieldKind::Contains),
            "ipv4" => Ok(CustomFieldKind::Ipv4),
            "hash" => Ok(CustomFieldKind::Hash),
            "datetime" => Ok(CustomFieldKind::Datetime),
            other => Err(format!(
                "unknown custom field kind '{}' (expected dropdown, contains, ipv4, hash or datetime)",
                other
            )),
        }
    }
}

/// An attribute that accepts boolean value expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterField {
    key: String,
    label: String,
    source: FieldSource,
    kind: ValueKind,
    match_kind: MatchKind,
    message: String,
    prompt: String,
}

impl FilterField {
    /// Creates a field descriptor.
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        source: FieldSource,
        kind: ValueKind,
        match_kind: MatchKind,
    ) -> Self {
        let key = key.into();
        Self {
            prompt: format!("{} expression", key),
            message: "Invalid value in expression.".to_string(),
            key,
            label: label.into(),
            source,
            kind,
            match_kind,
        }
    }

    /// Sets the message shown when a value is rejected.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the prompt shown when asking for an expression.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// A field backed by a custom field id.
    ///
    /// Returns `None` for [`CustomFieldKind::Datetime`], which is a range.
    pub fn custom(name: &str, id: u64, kind: CustomFieldKind) -> Option<Self> {
        let (value_kind, match_kind, message) = match kind {
            CustomFieldKind::Dropdown => (
                ValueKind::Token,
                MatchKind::Equals,
                "Invalid value in expression.",
            ),
            CustomFieldKind::Contains => (
                ValueKind::Text,
                MatchKind::Contains,
                "Invalid value in expression. Each must be 1-200 characters.",
            ),
            CustomFieldKind::Ipv4 => (
                ValueKind::Ipv4,
                MatchKind::Equals,
                "Invalid IPv4 address in expression.",
            ),
            CustomFieldKind::Hash => (
                ValueKind::Hash,
                MatchKind::Equals,
                "Invalid hash in expression. Use MD5/SHA1/SHA256 hex.",
            ),
            CustomFieldKind::Datetime => return None,
        };
        let field = Self::new(
            name,
            format!("{} filter", name),
            FieldSource::Custom(id),
            value_kind,
            match_kind,
        )
        .with_message(message)
        .with_prompt(format!("{} expression ({})", name, value_kind.describe()));
        Some(field)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn match_kind(&self) -> MatchKind {
        self.match_kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Compiles `input` into an atom described as `(<normalized input>)`.
    ///
    /// # Errors
    ///
    /// Rejected values are reported as [`FilterError::InvalidFieldValue`]
    /// carrying this field's message; structural errors pass through.
    pub fn compile(&self, input: &str) -> FilterResult<Atom> {
        let kind = self.kind;
        let expression = compile(input, kind.folds_case(), |v| kind.is_valid(v)).map_err(
            |err| match err {
                FilterError::InvalidValue { value } => FilterError::InvalidFieldValue {
                    field: self.label.clone(),
                    message: self.message.clone(),
                    suggestion: kind.suggest(&value),
                    value,
                },
                other => other,
            },
        )?;

        let description = format!("({})", expression.source());
        let source = self.source.clone();
        let match_kind = self.match_kind;
        let fold = kind.folds_case();

        Ok(Atom::new(description, move |record: &Record| {
            let haystack = FieldValue::read(record, &source, fold);
            expression.evaluate(|token| haystack.matches(token, match_kind))
        }))
    }
}

/// A record's value for one field, read once per evaluation.
enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    fn read(record: &Record, source: &FieldSource, fold: bool) -> Self {
        let fold_text = |s: String| if fold { s.to_lowercase() } else { s };
        match source {
            FieldSource::Attribute(name) => FieldValue::One(fold_text(record.text(name))),
            FieldSource::Custom(id) => FieldValue::One(fold_text(record.custom_text(*id))),
            FieldSource::Tags => FieldValue::Many(record.tags().into_iter().map(fold_text).collect()),
        }
    }

    fn matches(&self, token: &str, match_kind: MatchKind) -> bool {
        match (self, match_kind) {
            (FieldValue::One(value), MatchKind::Contains) => value.contains(token),
            (FieldValue::One(value), _) => value == token,
            (FieldValue::Many(values), MatchKind::Contains) => {
                values.iter().any(|v| v.contains(token))
            }
            (FieldValue::Many(values), _) => values.iter().any(|v| v == token),
        }
    }
}

/// Builds the standard ticket fields.
pub fn standard_fields() -> Vec<FilterField> {
    use FieldSource::Attribute;

    let id_field = |key: &str, attribute: &str, label: &str| {
        FilterField::new(
            key,
            label,
            Attribute(attribute.to_string()),
            ValueKind::Digits,
            MatchKind::Equals,
        )
        .with_message(format!(
            "Invalid {} in expression. Use digits only.",
            attribute
        ))
        .with_prompt(format!(
            "{} expression (digits; e.g., 1 OR 2 OR 3)",
            attribute
        ))
    };

    vec![
        FilterField::new(
            "organization",
            "Organization filter",
            Attribute("organization_id".to_string()),
            ValueKind::OrganizationId,
            MatchKind::Equals,
        )
        .with_message("Invalid organization_id in expression. Each must be 14 digits.")
        .with_prompt(
            "organization_id expression (e.g., (12345678912345 OR 12354678912345) AND 12364578912345)",
        ),
        FilterField::new(
            "recipient",
            "Recipient filter",
            Attribute("recipient".to_string()),
            ValueKind::Email,
            MatchKind::Equals,
        )
        .with_message("Invalid recipient email in expression.")
        .with_prompt("recipient expression (email; e.g., a@b.com OR c@d.com)"),
        id_field("requester", "requester_id", "Requester ID filter"),
        id_field("submitter", "submitter_id", "Submitter ID filter"),
        id_field("assignee", "assignee_id", "Assignee ID filter"),
        id_field("group", "group_id", "Group ID filter"),
        FilterField::new(
            "status",
            "Status filter",
            Attribute("status".to_string()),
            ValueKind::Status,
            MatchKind::Equals,
        )
        .with_message("Invalid status in expression.")
        .with_prompt("status expression (new|open|pending|hold|solved|closed; e.g., open OR pending)"),
        FilterField::new(
            "result-type",
            "Result Type filter",
            Attribute("result_type".to_string()),
            ValueKind::ResultType,
            MatchKind::Equals,
        )
        .with_message("Invalid result_type in expression.")
        .with_prompt("result_type expression (e.g., ticket OR user)"),
        FilterField::new(
            "type",
            "Type filter",
            Attribute("type".to_string()),
            ValueKind::Token,
            MatchKind::Equals,
        )
        .with_prompt("type expression (e.g., incident OR problem OR task OR question)"),
        FilterField::new(
            "subject",
            "Subject filter",
            Attribute("subject".to_string()),
            ValueKind::Text,
            MatchKind::Contains,
        )
        .with_message("Invalid subject value in expression. Each must be 1-200 characters.")
        .with_prompt("subject expression (contains; e.g., (urgent OR escalation) AND outage)"),
        FilterField::new(
            "description",
            "Description filter",
            Attribute("description".to_string()),
            ValueKind::Text,
            MatchKind::Contains,
        )
        .with_message("Invalid description value in expression. Each must be 1-200 characters.")
        .with_prompt("description expression (contains; e.g., (error OR failure) AND timeout)"),
        FilterField::new(
            "tags",
            "Tags filter",
            FieldSource::Tags,
            ValueKind::Token,
            MatchKind::Member,
        )
        .with_prompt("tags expression (e.g., (phishing OR malware) AND vip)"),
    ]
}
