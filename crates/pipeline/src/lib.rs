//! Core domain for staged document evaluation.
//!
//! This crate defines how a document is pushed through a graph of named
//! stages: the per-run state, the graph and its validation, the execution
//! engine, score extraction, weighted aggregation, and result projection.
//! Concrete stages live in the `nodes` crate; the oracle transport lives in
//! the `llm` crate.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines the [`ScoringOracle`] port; infrastructure crates implement it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`NodeId`, `FieldName`, `PipelineRunId`, ...) |
//! | [`types`] | Value types (`FieldValue`, `Timestamp`) |
//! | [`state`] | `RunState` and `StateUpdate` |
//! | [`score`] | Score extraction from oracle text |
//! | [`oracle`] | `ScoringOracle` port and `OracleRequest` |
//! | [`graph`] | `Stage`, `Edge`, `Condition`, `PipelineSpec` |
//! | [`engine`] | `compile` and `CompiledPipeline::run` |
//! | [`aggregate`] | `WeightedAggregator` |
//! | [`projection`] | `Projection` and `NamedValue` |
//! | [`workflow`] | `Workflow`: pipeline + input field + projection |
//! | [`errors`] | Error types |

pub mod aggregate;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod identifiers;
pub mod oracle;
pub mod projection;
pub mod score;
pub mod state;
pub mod types;
pub mod workflow;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use aggregate::{WeightedAggregator, WEIGHT_SUM_TOLERANCE};
pub use engine::{compile, CompiledPipeline, RunReport, StageVisit};
pub use errors::{GraphIntegrityError, OracleError, RunError, WeightError};
pub use graph::{Condition, Edge, PipelineSpec, PipelineSpecBuilder, Stage, Target};
pub use identifiers::{FieldName, NodeId, PipelineName, PipelineRunId};
pub use oracle::{OracleRequest, ScoringOracle, DOCUMENT_PLACEHOLDER};
pub use projection::{NamedValue, Projection};
pub use score::{extract_score, SCORE_MARKER};
pub use state::{RunState, StateUpdate};
pub use types::{FieldValue, Timestamp};
pub use workflow::{Evaluation, Workflow};
