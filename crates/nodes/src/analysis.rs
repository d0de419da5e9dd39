//! Text analysis workflow: classify, extract entities, summarise. No branching.

use std::sync::Arc;

use pipeline::{
    compile, Edge, FieldName, NodeId, PipelineName, PipelineSpec, Projection, ScoringOracle,
    Target, Workflow,
};

use crate::{prompts, BuildError, ClassifyStage, EntityStage, OracleCall, SummaryStage};

/// Pipeline name recorded on run reports.
pub const PIPELINE: &str = "text_analysis";

/// Input field holding the document.
pub const TEXT: &str = "text";
/// Output field: the trimmed category label.
pub const CLASSIFICATION: &str = "classification";
/// Output field: entities in oracle order.
pub const ENTITIES: &str = "entities";
/// Output field: the trimmed summary.
pub const SUMMARY: &str = "summary";

/// Node that classifies the document.
pub const CLASSIFY_NODE: &str = "classification_node";
/// Node that extracts entities.
pub const ENTITY_NODE: &str = "entity_extraction_node";
/// Node that summarises the document.
pub const SUMMARY_NODE: &str = "summarization_node";

/// Builds the text analysis workflow around `oracle`.
///
/// # Errors
///
/// Returns [`BuildError`] only if the built-in graph is invalid.
pub fn text_analysis(oracle: Arc<dyn ScoringOracle>) -> Result<Workflow, BuildError> {
    let text = FieldName::from_static(TEXT);
    let classification = FieldName::from_static(CLASSIFICATION);
    let entities = FieldName::from_static(ENTITIES);
    let summary = FieldName::from_static(SUMMARY);

    let call = |node: &'static str, instruction: &'static str| {
        OracleCall::new(
            NodeId::from_static(node),
            text.clone(),
            instruction,
            Arc::clone(&oracle),
        )
    };

    let spec = PipelineSpec::builder(PipelineName::from_static(PIPELINE))
        .input(text.clone())
        .stage(
            NodeId::from_static(CLASSIFY_NODE),
            Arc::new(ClassifyStage::new(
                call(CLASSIFY_NODE, prompts::CLASSIFICATION),
                classification.clone(),
            )),
        )
        .stage(
            NodeId::from_static(ENTITY_NODE),
            Arc::new(EntityStage::new(
                call(ENTITY_NODE, prompts::ENTITIES),
                entities.clone(),
            )),
        )
        .stage(
            NodeId::from_static(SUMMARY_NODE),
            Arc::new(SummaryStage::new(
                call(SUMMARY_NODE, prompts::SUMMARY),
                summary.clone(),
            )),
        )
        .entry(NodeId::from_static(CLASSIFY_NODE))
        .edge(
            NodeId::from_static(CLASSIFY_NODE),
            Edge::Always(Target::node(ENTITY_NODE)),
        )
        .edge(
            NodeId::from_static(ENTITY_NODE),
            Edge::Always(Target::node(SUMMARY_NODE)),
        )
        .edge(NodeId::from_static(SUMMARY_NODE), Edge::Always(Target::End))
        .build();

    let projection = Projection::new()
        .field("Classification", classification)
        .field("Entities", entities)
        .field("Summary", summary);

    Ok(Workflow::new(compile(spec)?, text, projection))
}
