//! Shared value types for the pipeline domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values that stages compute and edges inspect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

/// The value of one [`crate::RunState`] field.
///
/// Score fields hold a [`FieldValue::Number`] that is expected to lie in
/// `[0.0, 1.0]`; nothing here clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A numeric value such as a sub-score or the final score.
    Number(f64),
    /// Free text such as the input document, a label, or a summary.
    Text(String),
    /// An ordered sequence of strings (duplicates allowed).
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the number if this is a [`FieldValue::Number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a [`FieldValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items if this is a [`FieldValue::List`].
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl std::fmt::Display for FieldValue {
    /// Numbers render with exactly two decimals; lists are joined with `", "`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:.2}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_decimals_for_numbers() {
        assert_eq!(FieldValue::Number(0.8).to_string(), "0.80");
        assert_eq!(FieldValue::Number(0.744).to_string(), "0.74");
        assert_eq!(FieldValue::Number(1.0).to_string(), "1.00");
    }

    #[test]
    fn display_joins_lists() {
        let value = FieldValue::List(vec!["Paris".into(), "WHO".into()]);
        assert_eq!(value.to_string(), "Paris, WHO");
        assert_eq!(FieldValue::List(Vec::new()).to_string(), "");
    }

    #[test]
    fn serialises_untagged() {
        let json = serde_json::to_string(&FieldValue::Number(0.5)).unwrap();
        assert_eq!(json, "0.5");
        let back: FieldValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(back, FieldValue::List(vec!["a".into(), "b".into()]));
    }
}
