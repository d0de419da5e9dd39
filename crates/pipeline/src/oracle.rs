//! Port for the external scoring oracle.
//!
//! The engine never talks to a concrete provider. Stages receive an
//! `Arc<dyn ScoringOracle>` at construction time; infrastructure crates supply
//! the implementation and tests supply a scripted fake.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{NodeId, OracleError};

/// Placeholder replaced by the document text when a prompt is rendered.
pub const DOCUMENT_PLACEHOLDER: &str = "{document}";

/// One request to the scoring oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    /// The stage issuing the request.
    pub stage: NodeId,
    /// The document under evaluation.
    pub document: String,
    /// Instruction template describing the expected response shape.
    ///
    /// Every occurrence of [`DOCUMENT_PLACEHOLDER`] is substituted by
    /// [`OracleRequest::prompt`].
    pub instruction: String,
}

impl OracleRequest {
    /// Creates a request for `stage` over `document`.
    pub fn new(stage: NodeId, document: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            stage,
            document: document.into(),
            instruction: instruction.into(),
        }
    }

    /// Renders the instruction with the document substituted in.
    pub fn prompt(&self) -> String {
        self.instruction.replace(DOCUMENT_PLACEHOLDER, &self.document)
    }
}

/// External service that answers one evaluation request with free-form text.
///
/// Implementations must be safe for concurrent use and must return an error
/// rather than block indefinitely.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Sends `request` and returns the raw response text.
    async fn evaluate(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

#[async_trait]
impl ScoringOracle for Arc<dyn ScoringOracle> {
    async fn evaluate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        (**self).evaluate(request).await
    }
}
