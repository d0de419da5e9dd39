//! Per-run state threaded through the stages of a pipeline.
//!
//! A [`RunState`] is never mutated in place by the engine: each stage returns a
//! [`StateUpdate`] and the engine produces a new state with
//! [`RunState::merged`]. Concurrent runs therefore never share storage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FieldName, FieldValue};

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// The fields accumulated by one pipeline run, keyed by [`FieldName`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunState {
    fields: BTreeMap<FieldName, FieldValue>,
}

impl RunState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this state with `field` set to `value`.
    #[must_use]
    pub fn with(mut self, field: FieldName, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Returns the raw value of `field`, if present.
    pub fn get(&self, field: &FieldName) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns `field` as a number, if present and numeric.
    pub fn number(&self, field: &FieldName) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Returns `field` as text, if present and textual.
    pub fn text(&self, field: &FieldName) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Returns `field` as a list, if present and a list.
    pub fn list(&self, field: &FieldName) -> Option<&[String]> {
        self.get(field).and_then(FieldValue::as_list)
    }

    /// Returns `true` if `field` has been written or defaulted.
    pub fn contains(&self, field: &FieldName) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over every field in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldName, &FieldValue)> {
        self.fields.iter()
    }

    /// Returns a new state with every write in `update` applied over `self`.
    #[must_use]
    pub fn merged(&self, update: StateUpdate) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(update.writes);
        Self { fields }
    }

    pub(crate) fn insert_absent(&mut self, field: &FieldName, value: &FieldValue) {
        self.fields
            .entry(field.clone())
            .or_insert_with(|| value.clone());
    }
}

// ---------------------------------------------------------------------------
// StateUpdate
// ---------------------------------------------------------------------------

/// The writes produced by a single stage invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    writes: BTreeMap<FieldName, FieldValue>,
}

impl StateUpdate {
    /// Creates an update with no writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a write of `value` to `field`, replacing any earlier write to
    /// the same field in this update.
    #[must_use]
    pub fn set(mut self, field: FieldName, value: impl Into<FieldValue>) -> Self {
        self.writes.insert(field, value.into());
        self
    }

    /// Iterates over the fields written by this update.
    pub fn fields(&self) -> impl Iterator<Item = &FieldName> {
        self.writes.keys()
    }

    /// Returns `true` if this update writes `field`.
    pub fn contains(&self, field: &FieldName) -> bool {
        self.writes.contains_key(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &'static str) -> FieldName {
        FieldName::from_static(name)
    }

    #[test]
    fn merged_leaves_the_original_untouched() {
        let original = RunState::new()
            .with(field("essay"), "text")
            .with(field("grammar_score"), 0.0);

        let next = original.merged(StateUpdate::new().set(field("grammar_score"), 0.9));

        assert_eq!(original.number(&field("grammar_score")), Some(0.0));
        assert_eq!(next.number(&field("grammar_score")), Some(0.9));
        assert_eq!(next.text(&field("essay")), Some("text"));
    }

    #[test]
    fn typed_accessors_reject_other_variants() {
        let state = RunState::new().with(field("summary"), "short");
        assert_eq!(state.number(&field("summary")), None);
        assert_eq!(state.list(&field("summary")), None);
        assert_eq!(state.text(&field("missing")), None);
    }

    #[test]
    fn insert_absent_keeps_existing_values() {
        let mut state = RunState::new().with(field("relevance_score"), 0.7);
        state.insert_absent(&field("relevance_score"), &FieldValue::Number(0.0));
        state.insert_absent(&field("depth_score"), &FieldValue::Number(0.0));
        assert_eq!(state.number(&field("relevance_score")), Some(0.7));
        assert_eq!(state.number(&field("depth_score")), Some(0.0));
    }

    #[test]
    fn serialises_as_a_flat_object() {
        let state = RunState::new()
            .with(field("classification"), "News")
            .with(field("entities"), vec!["Paris".to_string()]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "classification": "News", "entities": ["Paris"] })
        );
    }
}
