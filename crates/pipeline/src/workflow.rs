//! A compiled pipeline bundled with its input field and output projection.
//!
//! This is the surface front-end adapters call: document text in, labelled
//! fields out.

use std::sync::Arc;

use serde::Serialize;

use crate::{CompiledPipeline, FieldName, NamedValue, Projection, RunError, RunReport};

/// Result of evaluating one document.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Full run report, including the final state.
    pub report: RunReport,
    /// Projected output fields, in display order.
    pub fields: Vec<NamedValue>,
}

/// A runnable pipeline with a fixed input field and projection.
///
/// Cloning is cheap; clones share the compiled graph.
#[derive(Debug, Clone)]
pub struct Workflow {
    pipeline: Arc<CompiledPipeline>,
    input: FieldName,
    projection: Projection,
}

impl Workflow {
    /// Bundles `pipeline` with the field that receives the document and the
    /// projection applied to the final state.
    pub fn new(pipeline: CompiledPipeline, input: FieldName, projection: Projection) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            input,
            projection,
        }
    }

    /// The underlying compiled pipeline.
    pub fn pipeline(&self) -> &CompiledPipeline {
        &self.pipeline
    }

    /// Runs the pipeline over `document` and projects the result.
    ///
    /// # Errors
    ///
    /// Propagates [`RunError`] from [`CompiledPipeline::run`]. With a document
    /// supplied and well-behaved stages this does not happen.
    pub async fn evaluate(&self, document: impl Into<String>) -> Result<Evaluation, RunError> {
        let initial = crate::RunState::new().with(self.input.clone(), document.into());
        let report = self.pipeline.run(&initial).await?;
        let fields = self.projection.project(&report.state);
        Ok(Evaluation { report, fields })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{compile, Edge, NodeId, PipelineName, PipelineSpec, RunState, Stage, StateUpdate, Target};

    struct Shout;

    #[async_trait]
    impl Stage for Shout {
        fn reads(&self) -> Vec<FieldName> {
            vec![FieldName::from_static("text")]
        }

        fn writes(&self) -> Vec<FieldName> {
            vec![FieldName::from_static("loud")]
        }

        async fn run(&self, state: &RunState) -> StateUpdate {
            let text = state.text(&FieldName::from_static("text")).unwrap_or_default();
            StateUpdate::new().set(FieldName::from_static("loud"), text.to_uppercase())
        }
    }

    #[tokio::test]
    async fn evaluate_seeds_input_and_projects() {
        let spec = PipelineSpec::builder(PipelineName::from_static("shout"))
            .input(FieldName::from_static("text"))
            .stage(NodeId::from_static("shout"), Arc::new(Shout))
            .edge(NodeId::from_static("shout"), Edge::Always(Target::End))
            .entry(NodeId::from_static("shout"))
            .build();
        let workflow = Workflow::new(
            compile(spec).unwrap(),
            FieldName::from_static("text"),
            Projection::new().field("Loud", FieldName::from_static("loud")),
        );

        let evaluation = workflow.clone().evaluate("hello").await.unwrap();

        assert_eq!(evaluation.fields[0].to_string(), "Loud: HELLO");
        assert_eq!(evaluation.report.state.text(&FieldName::from_static("text")), Some("hello"));
        assert_eq!(workflow.pipeline().name().as_str(), "shout");
    }
}
