//! Text-producing stages: classification, entity extraction, summarisation.
//!
//! Each stage makes one oracle call and applies a fixed, deterministic
//! post-processing step. On oracle failure the stage writes an empty value and
//! logs a warning.

use async_trait::async_trait;
use pipeline::{FieldName, RunState, Stage, StateUpdate};
use tracing::warn;

use crate::OracleCall;

/// Separator between entities in the oracle's reply.
pub const ENTITY_SEPARATOR: &str = ", ";

/// Splits a trimmed entity reply into an ordered list.
///
/// Order and duplicates are preserved. An empty reply yields a single empty
/// entry.
pub fn split_entities(response: &str) -> Vec<String> {
    response
        .trim()
        .split(ENTITY_SEPARATOR)
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------

/// Writes the oracle's category label, with surrounding whitespace trimmed.
#[derive(Debug)]
pub struct ClassifyStage {
    call: OracleCall,
    output: FieldName,
}

impl ClassifyStage {
    /// Creates a stage that writes its label to `output`.
    pub fn new(call: OracleCall, output: FieldName) -> Self {
        Self { call, output }
    }
}

#[async_trait]
impl Stage for ClassifyStage {
    fn reads(&self) -> Vec<FieldName> {
        vec![self.call.document_field().clone()]
    }

    fn writes(&self) -> Vec<FieldName> {
        vec![self.output.clone()]
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let label = match self.call.send(state).await {
            Ok(response) => response.trim().to_string(),
            Err(error) => {
                warn!(node = %self.call.node(), error = %error, "oracle call failed; leaving classification empty");
                String::new()
            }
        };
        StateUpdate::new().set(self.output.clone(), label)
    }
}

// ---------------------------------------------------------------------------

/// Writes the entities named in the oracle's comma-separated reply.
#[derive(Debug)]
pub struct EntityStage {
    call: OracleCall,
    output: FieldName,
}

impl EntityStage {
    /// Creates a stage that writes its entity list to `output`.
    pub fn new(call: OracleCall, output: FieldName) -> Self {
        Self { call, output }
    }
}

#[async_trait]
impl Stage for EntityStage {
    fn reads(&self) -> Vec<FieldName> {
        vec![self.call.document_field().clone()]
    }

    fn writes(&self) -> Vec<FieldName> {
        vec![self.output.clone()]
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let entities = match self.call.send(state).await {
            Ok(response) => split_entities(&response),
            Err(error) => {
                warn!(node = %self.call.node(), error = %error, "oracle call failed; no entities recorded");
                Vec::new()
            }
        };
        StateUpdate::new().set(self.output.clone(), entities)
    }
}

// ---------------------------------------------------------------------------

/// Writes the oracle's summary, with surrounding whitespace trimmed.
#[derive(Debug)]
pub struct SummaryStage {
    call: OracleCall,
    output: FieldName,
}

impl SummaryStage {
    /// Creates a stage that writes its summary to `output`.
    pub fn new(call: OracleCall, output: FieldName) -> Self {
        Self { call, output }
    }
}

#[async_trait]
impl Stage for SummaryStage {
    fn reads(&self) -> Vec<FieldName> {
        vec![self.call.document_field().clone()]
    }

    fn writes(&self) -> Vec<FieldName> {
        vec![self.output.clone()]
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let summary = match self.call.send(state).await {
            Ok(response) => response.trim().to_string(),
            Err(error) => {
                warn!(node = %self.call.node(), error = %error, "oracle call failed; leaving summary empty");
                String::new()
            }
        };
        StateUpdate::new().set(self.output.clone(), summary)
    }
}
