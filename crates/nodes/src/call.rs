//! Shared plumbing for stages that send the document to the oracle.

use std::sync::Arc;

use pipeline::{FieldName, NodeId, OracleError, OracleRequest, RunState, ScoringOracle};
use tracing::debug;

/// Everything a stage needs to issue its single oracle request.
pub struct OracleCall {
    node: NodeId,
    document: FieldName,
    instruction: String,
    oracle: Arc<dyn ScoringOracle>,
}

impl OracleCall {
    /// Creates a call for `node` that sends the text in `document` using the
    /// instruction template `instruction`.
    pub fn new(
        node: NodeId,
        document: FieldName,
        instruction: impl Into<String>,
        oracle: Arc<dyn ScoringOracle>,
    ) -> Self {
        Self {
            node,
            document,
            instruction: instruction.into(),
            oracle,
        }
    }

    /// The node issuing the call.
    pub fn node(&self) -> &NodeId {
        &self.node
    }

    /// The field holding the document text.
    pub fn document_field(&self) -> &FieldName {
        &self.document
    }

    /// Sends exactly one request built from `state`.
    pub async fn send(&self, state: &RunState) -> Result<String, OracleError> {
        let document = state.text(&self.document).unwrap_or_default();
        let request = OracleRequest::new(self.node.clone(), document, self.instruction.clone());
        let response = self.oracle.evaluate(&request).await?;
        debug!(node = %self.node, chars = response.len(), "oracle responded");
        Ok(response)
    }
}

impl std::fmt::Debug for OracleCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleCall")
            .field("node", &self.node)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}
