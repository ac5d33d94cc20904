//! Error types for filter compilation.

use thiserror::Error;

/// A specialized Result type for filter operations.
pub type FilterResult<T> = Result<T, FilterError>;

/// Errors that can occur while turning user input into a filter.
///
/// All of these are recoverable: the offending entry is rejected and the
/// operator can try again.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The expression is empty or contains no values.
    #[error("filter expression is empty")]
    EmptyExpression,

    /// A `)` without a matching `(`, or an unclosed `(`.
    #[error("mismatched parentheses")]
    MismatchedParentheses,

    /// A value token rejected by the field validator.
    #[error("invalid value in expression: {value}")]
    InvalidValue {
        /// The rejected (possibly case-folded) value.
        value: String,
    },

    /// A value token rejected by a specific field, with the field's message.
    #[error("{message} (got '{value}'){}", hint(.suggestion))]
    InvalidFieldValue {
        /// Label of the field being filtered.
        field: String,
        /// Field-specific explanation of what is accepted.
        message: String,
        /// The rejected value.
        value: String,
        /// Closest accepted value, for closed vocabularies.
        suggestion: Option<String>,
    },

    /// A range bound that does not have the expected shape.
    #[error("Invalid format, must match {expected} (example: {example}).")]
    InvalidRange {
        /// The accepted pattern.
        expected: String,
        /// A well-formed example.
        example: String,
    },

    /// A range whose start is after its end.
    #[error("Start must be less than or equal to end.")]
    RangeStartAfterEnd,

    /// A field name that is not in the catalogue.
    #[error("unknown filter field: {name}{}", hint(.suggestion))]
    UnknownField {
        /// The name as entered.
        name: String,
        /// Closest known field name.
        suggestion: Option<String>,
    },
}

fn hint(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(". Did you mean '{}'?", s),
        None => String::new(),
    }
}

impl FilterError {
    /// Creates an invalid value error.
    pub fn invalid_value(value: impl Into<String>) -> Self {
        FilterError::InvalidValue {
            value: value.into(),
        }
    }

    /// Creates an invalid range error.
    pub fn invalid_range(expected: impl Into<String>, example: impl Into<String>) -> Self {
        FilterError::InvalidRange {
            expected: expected.into(),
            example: example.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(name: impl Into<String>, suggestion: Option<String>) -> Self {
        FilterError::UnknownField {
            name: name.into(),
            suggestion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_message_with_suggestion() {
        let err = FilterError::InvalidFieldValue {
            field: "Status filter".to_string(),
            message: "Invalid status in expression.".to_string(),
            value: "opne".to_string(),
            suggestion: Some("open".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Invalid status in expression. (got 'opne'). Did you mean 'open'?"
        );
    }

    #[test]
    fn test_unknown_field_without_suggestion() {
        let err = FilterError::unknown_field("zzz", None);
        assert_eq!(err.to_string(), "unknown filter field: zzz");
    }

    #[test]
    fn test_invalid_range_message() {
        let err = FilterError::invalid_range("YYYY-MM-DD", "2025-07-31");
        assert_eq!(
            err.to_string(),
            "Invalid format, must match YYYY-MM-DD (example: 2025-07-31)."
        );
    }
}
