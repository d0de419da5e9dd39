//! Pipeline graph definition: stages, edges, and routing conditions.
//!
//! A [`PipelineSpec`] is plain data plus stage handles. It is checked and
//! frozen by [`crate::compile`]; nothing here validates anything.
//!
//! Conditional edges are expressed as a tagged [`Condition`] rather than a
//! closure so that the compiler can see which field each branch inspects and
//! every branch target it may select.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{FieldName, FieldValue, NodeId, PipelineName, RunState, StateUpdate};

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One named unit of pipeline work.
///
/// A stage reads the current [`RunState`] and returns the fields it writes.
/// It must only write fields listed by [`Stage::writes`] and may only rely on
/// fields listed by [`Stage::reads`]. Stages are infallible from the engine's
/// point of view: an oracle failure is absorbed by writing the stage's default.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Fields this stage reads from the state.
    fn reads(&self) -> Vec<FieldName>;

    /// Fields this stage may write.
    fn writes(&self) -> Vec<FieldName>;

    /// Runs the stage against `state`.
    async fn run(&self, state: &RunState) -> StateUpdate;
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Where control goes after a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Run the named stage next.
    Node(NodeId),
    /// Stop: the run is complete.
    End,
}

impl Target {
    /// Shorthand for [`Target::Node`] with a literal node name.
    pub fn node(name: &'static str) -> Self {
        Self::Node(NodeId::from_static(name))
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(id) => write!(f, "{id}"),
            Self::End => write!(f, "END"),
        }
    }
}

/// A pure predicate over a [`RunState`].
///
/// Absent or non-numeric fields compare as `0.0`; absent or non-text fields
/// compare as the empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field > threshold`.
    Above {
        /// Numeric field to compare.
        field: FieldName,
        /// Exclusive lower bound.
        threshold: f64,
    },
    /// `field >= threshold`.
    AtLeast {
        /// Numeric field to compare.
        field: FieldName,
        /// Inclusive lower bound.
        threshold: f64,
    },
    /// `field == value` for a text field.
    Equals {
        /// Text field to compare.
        field: FieldName,
        /// Expected value.
        value: String,
    },
}

impl Condition {
    /// The field this condition inspects.
    pub fn field(&self) -> &FieldName {
        match self {
            Self::Above { field, .. } | Self::AtLeast { field, .. } | Self::Equals { field, .. } => {
                field
            }
        }
    }

    /// The numeric threshold, if this is a numeric comparison.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            Self::Above { threshold, .. } | Self::AtLeast { threshold, .. } => Some(*threshold),
            Self::Equals { .. } => None,
        }
    }

    /// Evaluates the condition against `state`.
    pub fn holds(&self, state: &RunState) -> bool {
        match self {
            Self::Above { field, threshold } => state.number(field).unwrap_or(0.0) > *threshold,
            Self::AtLeast { field, threshold } => state.number(field).unwrap_or(0.0) >= *threshold,
            Self::Equals { field, value } => state.text(field).unwrap_or_default() == value.as_str(),
        }
    }
}

/// The outgoing edge of a stage. Always resolves to exactly one [`Target`].
#[derive(Debug, Clone, PartialEq)]
pub enum Edge {
    /// Unconditionally continue to `0`.
    Always(Target),
    /// Continue to `then` if `condition` holds on the updated state, else to
    /// `otherwise`.
    When {
        /// The routing predicate.
        condition: Condition,
        /// Target when the predicate holds.
        then: Target,
        /// Target when it does not.
        otherwise: Target,
    },
}

impl Edge {
    /// Resolves the next target for `state`.
    pub fn resolve(&self, state: &RunState) -> &Target {
        match self {
            Self::Always(target) => target,
            Self::When {
                condition,
                then,
                otherwise,
            } => {
                if condition.holds(state) {
                    then
                } else {
                    otherwise
                }
            }
        }
    }

    /// Every target this edge can select.
    pub fn targets(&self) -> Vec<&Target> {
        match self {
            Self::Always(target) => vec![target],
            Self::When {
                then, otherwise, ..
            } => vec![then, otherwise],
        }
    }

    /// The routing condition, if any.
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            Self::Always(_) => None,
            Self::When { condition, .. } => Some(condition),
        }
    }
}

// ---------------------------------------------------------------------------
// Definition
// ---------------------------------------------------------------------------

/// Uncompiled description of a pipeline.
///
/// Build one with [`PipelineSpec::builder`], then pass it to
/// [`crate::compile`].
pub struct PipelineSpec {
    pub(crate) name: PipelineName,
    pub(crate) inputs: Vec<FieldName>,
    pub(crate) defaults: Vec<(FieldName, FieldValue)>,
    pub(crate) stages: Vec<(NodeId, Arc<dyn Stage>)>,
    pub(crate) edges: Vec<(NodeId, Edge)>,
    pub(crate) entry: Option<NodeId>,
}

impl PipelineSpec {
    /// Starts a new pipeline definition named `name`.
    pub fn builder(name: PipelineName) -> PipelineSpecBuilder {
        PipelineSpecBuilder {
            spec: PipelineSpec {
                name,
                inputs: Vec::new(),
                defaults: Vec::new(),
                stages: Vec::new(),
                edges: Vec::new(),
                entry: None,
            },
        }
    }
}

impl std::fmt::Debug for PipelineSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineSpec")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("defaults", &self.defaults)
            .field(
                "stages",
                &self.stages.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field("edges", &self.edges)
            .field("entry", &self.entry)
            .finish()
    }
}

/// Fluent builder for [`PipelineSpec`].
#[derive(Debug)]
pub struct PipelineSpecBuilder {
    spec: PipelineSpec,
}

impl PipelineSpecBuilder {
    /// Declares `field` as a required input supplied by the caller.
    pub fn input(mut self, field: FieldName) -> Self {
        self.spec.inputs.push(field);
        self
    }

    /// Declares the value `field` holds until a stage writes it.
    pub fn default(mut self, field: FieldName, value: impl Into<FieldValue>) -> Self {
        self.spec.defaults.push((field, value.into()));
        self
    }

    /// Registers `stage` under the node name `id`.
    pub fn stage(mut self, id: NodeId, stage: Arc<dyn Stage>) -> Self {
        self.spec.stages.push((id, stage));
        self
    }

    /// Sets the outgoing edge of node `from`.
    pub fn edge(mut self, from: NodeId, edge: Edge) -> Self {
        self.spec.edges.push((from, edge));
        self
    }

    /// Sets the entry node.
    pub fn entry(mut self, id: NodeId) -> Self {
        self.spec.entry = Some(id);
        self
    }

    /// Finishes the definition.
    pub fn build(self) -> PipelineSpec {
        self.spec
    }
}
