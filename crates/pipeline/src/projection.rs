//! Mapping a final [`RunState`] onto labelled display fields.

use serde::Serialize;

use crate::{FieldName, RunState};

/// One labelled, rendered output value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedValue {
    /// Human-readable label (e.g. `"Final Score"`).
    pub label: String,
    /// Rendered value (e.g. `"0.74"`).
    pub value: String,
}

impl std::fmt::Display for NamedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// A fixed, ordered list of `(label, field)` pairs.
///
/// [`Projection::project`] is total: numbers render with two decimals, lists
/// are joined with `", "`, and absent fields render as the empty string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: Vec<(String, FieldName)>,
}

impl Projection {
    /// Creates an empty projection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `field`, shown under `label`.
    #[must_use]
    pub fn field(mut self, label: impl Into<String>, field: FieldName) -> Self {
        self.fields.push((label.into(), field));
        self
    }

    /// The labels, in output order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(label, _)| label.as_str())
    }

    /// Renders `state` into the configured fields.
    pub fn project(&self, state: &RunState) -> Vec<NamedValue> {
        self.fields
            .iter()
            .map(|(label, field)| NamedValue {
                label: label.clone(),
                value: state.get(field).map(ToString::to_string).unwrap_or_default(),
            })
            .collect()
    }
}
