//! Essay grading workflow.
//!
//! Four criteria are scored in turn. Each criterion gates the next: a score
//! that does not exceed [`GATE_THRESHOLD`] skips every remaining criterion and
//! jumps straight to aggregation, where the skipped scores count as zero.
//!
//! ```text
//! check_relevance ─► check_grammar ─► analyze_structure ─► evaluate_depth ─┐
//!        │                 │                  │                            ▼
//!        └─────────────────┴──────────────────┴──────────► calculate_final_score ─► END
//! ```

use std::sync::Arc;

use pipeline::{
    compile, Condition, Edge, FieldName, NodeId, PipelineName, PipelineSpec, Projection,
    ScoringOracle, Target, WeightedAggregator, Workflow,
};

use crate::{prompts, AggregateStage, BuildError, OracleCall, ScoreStage, DEFAULT_SCORE};

/// Name of the essay grading pipeline.
pub const PIPELINE: &str = "essay_grading";

/// A criterion must score strictly above this to let grading continue.
pub const GATE_THRESHOLD: f64 = 0.5;

/// Field holding the essay text.
pub const ESSAY: &str = "essay";
/// Field holding the aggregated score.
pub const FINAL_SCORE: &str = "final_score";
/// Node computing [`FINAL_SCORE`].
pub const AGGREGATE_NODE: &str = "calculate_final_score";

/// One graded criterion.
#[derive(Debug, Clone, Copy)]
pub struct Criterion {
    /// Node name.
    pub node: &'static str,
    /// Score field written by the node.
    pub field: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Weight in the final score.
    pub weight: f64,
    instruction: &'static str,
}

/// Criteria in evaluation order.
pub const CRITERIA: [Criterion; 4] = [
    Criterion {
        node: "check_relevance",
        field: "relevance_score",
        label: "Relevance Score",
        weight: 0.3,
        instruction: prompts::RELEVANCE,
    },
    Criterion {
        node: "check_grammar",
        field: "grammar_score",
        label: "Grammar Score",
        weight: 0.2,
        instruction: prompts::GRAMMAR,
    },
    Criterion {
        node: "analyze_structure",
        field: "structure_score",
        label: "Structure Score",
        weight: 0.2,
        instruction: prompts::STRUCTURE,
    },
    Criterion {
        node: "evaluate_depth",
        field: "depth_score",
        label: "Depth Score",
        weight: 0.3,
        instruction: prompts::DEPTH,
    },
];

/// Builds the essay grading workflow around `oracle`.
///
/// # Errors
///
/// Returns [`BuildError`] only if the built-in graph or weights are invalid.
pub fn essay_grading(oracle: Arc<dyn ScoringOracle>) -> Result<Workflow, BuildError> {
    let essay = FieldName::from_static(ESSAY);
    let final_score = FieldName::from_static(FINAL_SCORE);
    let aggregate_node = NodeId::from_static(AGGREGATE_NODE);

    let aggregator = WeightedAggregator::new(
        CRITERIA
            .iter()
            .map(|c| (FieldName::from_static(c.field), c.weight))
            .collect(),
    )?;

    let mut builder = PipelineSpec::builder(PipelineName::from_static(PIPELINE))
        .input(essay.clone())
        .default(final_score.clone(), DEFAULT_SCORE)
        .entry(NodeId::from_static(CRITERIA[0].node));

    for (position, criterion) in CRITERIA.iter().enumerate() {
        let node = NodeId::from_static(criterion.node);
        let field = FieldName::from_static(criterion.field);
        let call = OracleCall::new(
            node.clone(),
            essay.clone(),
            criterion.instruction,
            Arc::clone(&oracle),
        );

        let edge = match CRITERIA.get(position + 1) {
            Some(next) => Edge::When {
                condition: Condition::Above {
                    field: field.clone(),
                    threshold: GATE_THRESHOLD,
                },
                then: Target::node(next.node),
                otherwise: Target::Node(aggregate_node.clone()),
            },
            None => Edge::Always(Target::Node(aggregate_node.clone())),
        };

        builder = builder
            .default(field.clone(), DEFAULT_SCORE)
            .stage(node.clone(), Arc::new(ScoreStage::new(call, field)))
            .edge(node, edge);
    }

    let spec = builder
        .stage(
            aggregate_node.clone(),
            Arc::new(AggregateStage::new(aggregator, final_score.clone())),
        )
        .edge(aggregate_node, Edge::Always(Target::End))
        .build();

    let projection = CRITERIA.iter().fold(
        Projection::new().field("Final Score", final_score),
        |projection, criterion| {
            projection.field(criterion.label, FieldName::from_static(criterion.field))
        },
    );

    Ok(Workflow::new(compile(spec)?, essay, projection))
}
