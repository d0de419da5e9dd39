//! Concrete pipeline stages and the prebuilt workflows.
//!
//! This crate provides the oracle-backed stages (scoring, classification,
//! entity extraction, summarisation), the aggregation stage, the instruction
//! templates, and two ready-made workflows:
//!
//! - [`essay_grading`]: four gated score stages followed by weighted
//!   aggregation.
//! - [`text_analysis`]: classification, entity extraction, and summarisation
//!   in a fixed linear order.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Stages sequence calls to the
//! [`pipeline::ScoringOracle`] port and post-process replies. The graph
//! semantics (gating, defaults, aggregation) come from the [`pipeline`] crate.

pub mod aggregate;
pub mod analysis;
pub mod call;
pub mod essay;
pub mod prompts;
pub mod scoring;
pub mod text;

use thiserror::Error;

pub use aggregate::AggregateStage;
pub use analysis::text_analysis;
pub use call::OracleCall;
pub use essay::essay_grading;
pub use scoring::{ScoreStage, DEFAULT_SCORE};
pub use text::{split_entities, ClassifyStage, EntityStage, SummaryStage, ENTITY_SEPARATOR};

/// Failure to assemble a built-in workflow.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The graph failed validation.
    #[error(transparent)]
    Graph(#[from] pipeline::GraphIntegrityError),

    /// The aggregation weights are invalid.
    #[error(transparent)]
    Weights(#[from] pipeline::WeightError),
}
