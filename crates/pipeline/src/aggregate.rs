//! Deterministic weighted combination of sub-scores.

use std::collections::HashSet;

use crate::{FieldName, RunState, WeightError};

/// Largest permitted distance between the weight sum and 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Combines named numeric fields into a single score using fixed weights.
///
/// A field that was never computed counts as `0.0`: skipping a stage lowers
/// the result rather than re-normalising the remaining weights.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedAggregator {
    weights: Vec<(FieldName, f64)>,
}

impl WeightedAggregator {
    /// Creates an aggregator from `(field, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Rejects an empty set, duplicate fields, weights that are negative or not
    /// finite, and sets whose sum differs from 1.0 by more than
    /// [`WEIGHT_SUM_TOLERANCE`].
    pub fn new(weights: Vec<(FieldName, f64)>) -> Result<Self, WeightError> {
        if weights.is_empty() {
            return Err(WeightError::Empty);
        }

        let mut seen = HashSet::with_capacity(weights.len());
        for (field, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(WeightError::Invalid {
                    field: field.clone(),
                    weight: *weight,
                });
            }
            if !seen.insert(field) {
                return Err(WeightError::Duplicate {
                    field: field.clone(),
                });
            }
        }

        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightError::BadSum { sum });
        }

        Ok(Self { weights })
    }

    /// The weighted fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldName> {
        self.weights.iter().map(|(field, _)| field)
    }

    /// Computes the weighted sum over `state`.
    pub fn aggregate(&self, state: &RunState) -> f64 {
        self.weights
            .iter()
            .map(|(field, weight)| state.number(field).unwrap_or(0.0) * weight)
            .sum()
    }
}
