//! Score-bearing stage: one oracle call, one numeric field.

use async_trait::async_trait;
use pipeline::{extract_score, FieldName, RunState, Stage, StateUpdate};
use tracing::warn;

use crate::OracleCall;

/// Value written when the oracle fails or its reply carries no score.
pub const DEFAULT_SCORE: f64 = 0.0;

/// Asks the oracle to rate the document and writes the extracted score.
///
/// Both an oracle failure and a reply without a `Score:` marker are logged and
/// recorded as [`DEFAULT_SCORE`]; the two cases are indistinguishable in the
/// resulting state.
#[derive(Debug)]
pub struct ScoreStage {
    call: OracleCall,
    output: FieldName,
}

impl ScoreStage {
    /// Creates a stage that writes its score to `output`.
    pub fn new(call: OracleCall, output: FieldName) -> Self {
        Self { call, output }
    }
}

#[async_trait]
impl Stage for ScoreStage {
    fn reads(&self) -> Vec<FieldName> {
        vec![self.call.document_field().clone()]
    }

    fn writes(&self) -> Vec<FieldName> {
        vec![self.output.clone()]
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let score = match self.call.send(state).await {
            Ok(response) => extract_score(&response).unwrap_or_else(|| {
                warn!(
                    node = %self.call.node(),
                    response = %response,
                    "could not extract score; defaulting to {DEFAULT_SCORE}"
                );
                DEFAULT_SCORE
            }),
            Err(error) => {
                warn!(
                    node = %self.call.node(),
                    error = %error,
                    "oracle call failed; defaulting to {DEFAULT_SCORE}"
                );
                DEFAULT_SCORE
            }
        };
        StateUpdate::new().set(self.output.clone(), score)
    }
}
