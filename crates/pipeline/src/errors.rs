//! Error types for the pipeline domain.
//!
//! [`GraphIntegrityError`] is produced only by [`crate::compile`]; a pipeline
//! that compiles can never hit one at run time. [`RunError`] covers the few
//! conditions that stop a run. [`OracleError`] never stops a run: the owning
//! stage logs it and substitutes its declared default.

use thiserror::Error;

use crate::{FieldName, NodeId};

// ---------------------------------------------------------------------------
// Compile-time errors
// ---------------------------------------------------------------------------

/// A structural defect in a [`crate::PipelineSpec`] that rejects it before any
/// run can start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphIntegrityError {
    /// The pipeline declares no stages.
    #[error("pipeline has no stages")]
    Empty,

    /// Two stages were registered under the same node name.
    #[error("node '{node}' is declared more than once")]
    DuplicateNode {
        /// The repeated node name.
        node: NodeId,
    },

    /// A node was given more than one outgoing edge.
    #[error("node '{node}' has more than one outgoing edge")]
    DuplicateEdge {
        /// The node with conflicting edges.
        node: NodeId,
    },

    /// No entry node was set.
    #[error("pipeline has no entry node")]
    MissingEntry,

    /// The entry node does not name a declared stage.
    #[error("entry node '{node}' does not exist")]
    UnknownEntry {
        /// The unresolved entry name.
        node: NodeId,
    },

    /// An edge was attached to a node that does not exist.
    #[error("edge declared from unknown node '{node}'")]
    UnknownSource {
        /// The unresolved source name.
        node: NodeId,
    },

    /// An edge points at a node that does not exist.
    #[error("edge from '{from}' targets unknown node '{target}'")]
    UnknownTarget {
        /// The node owning the edge.
        from: NodeId,
        /// The unresolved target name.
        target: NodeId,
    },

    /// A node has no outgoing edge and so cannot reach the terminal marker.
    #[error("node '{node}' has no outgoing edge")]
    MissingEdge {
        /// The dead-end node.
        node: NodeId,
    },

    /// The graph contains a cycle through `node`.
    #[error("cycle detected through node '{node}'")]
    Cycle {
        /// A node on the cycle.
        node: NodeId,
    },

    /// A node cannot be reached from the entry node.
    #[error("node '{node}' is unreachable from the entry node")]
    Unreachable {
        /// The orphaned node.
        node: NodeId,
    },

    /// A stage reads a field that is not guaranteed to exist when it runs.
    #[error("node '{node}' reads field '{field}' which is neither an input, a default, nor written on every path to it")]
    UnavailableField {
        /// The reading stage.
        node: NodeId,
        /// The field that may be absent.
        field: FieldName,
    },

    /// A conditional edge inspects a field that is not guaranteed to exist
    /// after its source stage runs.
    #[error("edge from '{node}' tests field '{field}' which may be absent")]
    UnavailableConditionField {
        /// The node owning the edge.
        node: NodeId,
        /// The tested field.
        field: FieldName,
    },

    /// A stage declares a write to one of the pipeline's input fields.
    #[error("node '{node}' writes input field '{field}'")]
    WritesInput {
        /// The offending stage.
        node: NodeId,
        /// The input field it declares as output.
        field: FieldName,
    },

    /// A conditional edge compares against NaN or infinity.
    #[error("edge from '{node}' uses a non-finite threshold")]
    InvalidThreshold {
        /// The node owning the edge.
        node: NodeId,
    },
}

// ---------------------------------------------------------------------------
// Run-time errors
// ---------------------------------------------------------------------------

/// Conditions that stop a run of a compiled pipeline.
///
/// Oracle failures are deliberately absent: stages absorb them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// The initial state lacks a field the pipeline declares as input.
    #[error("initial state is missing input field '{field}'")]
    MissingInput {
        /// The absent input field.
        field: FieldName,
    },

    /// A stage wrote a field outside its declared output set.
    #[error("stage '{node}' wrote undeclared field '{field}'")]
    UndeclaredWrite {
        /// The offending stage.
        node: NodeId,
        /// The field it was not allowed to write.
        field: FieldName,
    },

    /// A stage returned without writing a field it declares.
    #[error("stage '{node}' did not write declared field '{field}'")]
    MissingWrite {
        /// The offending stage.
        node: NodeId,
        /// The declared field left unwritten.
        field: FieldName,
    },
}

// ---------------------------------------------------------------------------
// Oracle errors
// ---------------------------------------------------------------------------

/// Failure of a single scoring-oracle round-trip.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    /// The request could not be delivered or the connection failed.
    #[error("oracle transport error: {0}")]
    Transport(String),

    /// The oracle did not answer within the configured timeout.
    #[error("oracle request timed out")]
    Timeout,

    /// The oracle answered with a non-success status.
    #[error("oracle returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),

    /// The response carried no text.
    #[error("oracle returned an empty response")]
    EmptyResponse,
}

// ---------------------------------------------------------------------------
// Aggregation configuration errors
// ---------------------------------------------------------------------------

/// An invalid weight set passed to [`crate::WeightedAggregator::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    /// No weights were given.
    #[error("weight set is empty")]
    Empty,

    /// A weight is negative, NaN, or infinite.
    #[error("weight for '{field}' must be a finite non-negative number, got {weight}")]
    Invalid {
        /// The offending field.
        field: FieldName,
        /// The rejected weight.
        weight: f64,
    },

    /// The same field was weighted twice.
    #[error("field '{field}' is weighted more than once")]
    Duplicate {
        /// The repeated field.
        field: FieldName,
    },

    /// The weights do not sum to 1.0.
    #[error("weights sum to {sum}, expected 1.0")]
    BadSum {
        /// The actual sum.
        sum: f64,
    },
}
