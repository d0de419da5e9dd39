//! Terminal aggregation stage.

use async_trait::async_trait;
use pipeline::{FieldName, RunState, Stage, StateUpdate, WeightedAggregator};
use tracing::info;

/// Writes the weighted combination of the sub-scores to a single field.
#[derive(Debug)]
pub struct AggregateStage {
    aggregator: WeightedAggregator,
    output: FieldName,
}

impl AggregateStage {
    /// Creates a stage writing `aggregator`'s result to `output`.
    pub fn new(aggregator: WeightedAggregator, output: FieldName) -> Self {
        Self { aggregator, output }
    }
}

#[async_trait]
impl Stage for AggregateStage {
    fn reads(&self) -> Vec<FieldName> {
        self.aggregator.fields().cloned().collect()
    }

    fn writes(&self) -> Vec<FieldName> {
        vec![self.output.clone()]
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let score = self.aggregator.aggregate(state);
        info!(field = %self.output, score, "aggregated final score");
        StateUpdate::new().set(self.output.clone(), score)
    }
}
