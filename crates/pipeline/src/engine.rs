//! Pipeline compilation and execution.
//!
//! [`compile`] checks a [`PipelineSpec`] once and freezes it into a
//! [`CompiledPipeline`]. Every structural defect (unknown nodes, dead ends,
//! cycles, reads of fields that may be absent) is rejected there, so
//! [`CompiledPipeline::run`] never encounters one.
//!
//! ## Execution model
//!
//! A run walks the graph from the entry node, one stage at a time. After each
//! stage the engine merges the stage's writes into a fresh [`RunState`] and
//! resolves the stage's outgoing edge against that updated state. The walk
//! stops at [`Target::End`]. Because the graph is acyclic every run
//! terminates, and because the compiled graph is immutable any number of runs
//! may share it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};

use crate::{
    Condition, Edge, FieldName, FieldValue, GraphIntegrityError, NodeId, PipelineName,
    PipelineRunId, PipelineSpec, RunError, RunState, Stage, Target, Timestamp,
};

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// Resolved successor: an index into [`CompiledPipeline::nodes`] or the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Node(usize),
    End,
}

#[derive(Debug, Clone)]
enum CompiledEdge {
    Always(Step),
    When {
        condition: Condition,
        then: Step,
        otherwise: Step,
    },
}

impl CompiledEdge {
    fn resolve(&self, state: &RunState) -> Step {
        match self {
            Self::Always(step) => *step,
            Self::When {
                condition,
                then,
                otherwise,
            } => {
                if condition.holds(state) {
                    *then
                } else {
                    *otherwise
                }
            }
        }
    }
}

struct CompiledNode {
    id: NodeId,
    stage: Arc<dyn Stage>,
    writes: BTreeSet<FieldName>,
    edge: CompiledEdge,
}

/// A validated, immutable pipeline ready to run.
///
/// Cheap to share behind an [`Arc`]; holds no per-run state.
pub struct CompiledPipeline {
    name: PipelineName,
    inputs: Vec<FieldName>,
    defaults: Vec<(FieldName, FieldValue)>,
    nodes: Vec<CompiledNode>,
    entry: usize,
    order: Vec<usize>,
}

impl std::fmt::Debug for CompiledPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPipeline")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("nodes", &self.topological_order())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

/// One executed stage within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageVisit {
    /// The stage that ran.
    pub node: NodeId,
    /// Wall-clock time spent in the stage, in milliseconds.
    pub latency_ms: u64,
}

/// Outcome of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Identifier of this run.
    pub run_id: PipelineRunId,
    /// Pipeline that produced the report.
    pub pipeline: PipelineName,
    /// Final state after the last stage.
    pub state: RunState,
    /// Stages executed, in order.
    pub visits: Vec<StageVisit>,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run reached the terminal marker.
    pub finished_at: Timestamp,
}

impl RunReport {
    /// Names of the executed stages, in order.
    pub fn path(&self) -> Vec<&NodeId> {
        self.visits.iter().map(|v| &v.node).collect()
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Validates `spec` and freezes it into a [`CompiledPipeline`].
///
/// # Errors
///
/// Returns the first [`GraphIntegrityError`] found. Checks run in this order:
/// node declarations, edges, entry, acyclicity and reachability, writes to
/// input fields, field availability.
pub fn compile(spec: PipelineSpec) -> Result<CompiledPipeline, GraphIntegrityError> {
    let PipelineSpec {
        name,
        inputs,
        defaults,
        stages,
        edges,
        entry,
    } = spec;

    if stages.is_empty() {
        return Err(GraphIntegrityError::Empty);
    }

    let mut index_of: HashMap<NodeId, usize> = HashMap::with_capacity(stages.len());
    for (index, (id, _)) in stages.iter().enumerate() {
        if index_of.insert(id.clone(), index).is_some() {
            return Err(GraphIntegrityError::DuplicateNode { node: id.clone() });
        }
    }

    let mut edge_of: Vec<Option<Edge>> = vec![None; stages.len()];
    for (from, edge) in edges {
        let Some(&index) = index_of.get(&from) else {
            return Err(GraphIntegrityError::UnknownSource { node: from });
        };
        if edge_of[index].is_some() {
            return Err(GraphIntegrityError::DuplicateEdge { node: from });
        }
        for target in edge.targets() {
            if let Target::Node(id) = target {
                if !index_of.contains_key(id) {
                    return Err(GraphIntegrityError::UnknownTarget {
                        from,
                        target: id.clone(),
                    });
                }
            }
        }
        if let Some(threshold) = edge.condition().and_then(Condition::threshold) {
            if !threshold.is_finite() {
                return Err(GraphIntegrityError::InvalidThreshold { node: from });
            }
        }
        edge_of[index] = Some(edge);
    }

    let mut resolved_edges = Vec::with_capacity(stages.len());
    for ((id, _), edge) in stages.iter().zip(edge_of) {
        let edge = edge.ok_or_else(|| GraphIntegrityError::MissingEdge { node: id.clone() })?;
        resolved_edges.push(edge);
    }

    let entry_id = entry.ok_or(GraphIntegrityError::MissingEntry)?;
    let entry = *index_of
        .get(&entry_id)
        .ok_or(GraphIntegrityError::UnknownEntry { node: entry_id })?;

    let step_of = |target: &Target| match target {
        Target::Node(id) => Step::Node(index_of[id]),
        Target::End => Step::End,
    };
    let compiled_edges: Vec<CompiledEdge> = resolved_edges
        .iter()
        .map(|edge| match edge {
            Edge::Always(target) => CompiledEdge::Always(step_of(target)),
            Edge::When {
                condition,
                then,
                otherwise,
            } => CompiledEdge::When {
                condition: condition.clone(),
                then: step_of(then),
                otherwise: step_of(otherwise),
            },
        })
        .collect();

    let successors: Vec<Vec<usize>> = compiled_edges.iter().map(successors_of).collect();
    let order = topological_order(entry, &successors, &stages)?;

    let nodes: Vec<CompiledNode> = stages
        .into_iter()
        .zip(compiled_edges)
        .map(|((id, stage), edge)| CompiledNode {
            writes: stage.writes().into_iter().collect(),
            id,
            stage,
            edge,
        })
        .collect();

    for node in &nodes {
        if let Some(field) = inputs.iter().find(|f| node.writes.contains(*f)) {
            return Err(GraphIntegrityError::WritesInput {
                node: node.id.clone(),
                field: field.clone(),
            });
        }
    }

    check_field_availability(&inputs, &defaults, &nodes, &resolved_edges, &successors, &order)?;

    Ok(CompiledPipeline {
        name,
        inputs,
        defaults,
        nodes,
        entry,
        order,
    })
}

fn successors_of(edge: &CompiledEdge) -> Vec<usize> {
    let steps = match edge {
        CompiledEdge::Always(step) => vec![*step],
        CompiledEdge::When {
            then, otherwise, ..
        } => vec![*then, *otherwise],
    };
    let mut out: Vec<usize> = steps
        .into_iter()
        .filter_map(|step| match step {
            Step::Node(index) => Some(index),
            Step::End => None,
        })
        .collect();
    out.dedup();
    out
}

/// Depth-first search from `entry`. Returns nodes in topological order, or
/// the first cycle or unreachable node found.
fn topological_order(
    entry: usize,
    successors: &[Vec<usize>],
    stages: &[(NodeId, Arc<dyn Stage>)],
) -> Result<Vec<usize>, GraphIntegrityError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; successors.len()];
    let mut post_order = Vec::with_capacity(successors.len());
    // Explicit stack of (node, next successor position) keeps deep graphs off
    // the call stack.
    let mut stack: Vec<(usize, usize)> = vec![(entry, 0)];
    marks[entry] = Mark::InProgress;

    while let Some(frame) = stack.last_mut() {
        let (node, cursor) = *frame;
        if let Some(&next) = successors[node].get(cursor) {
            frame.1 += 1;
            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::InProgress;
                    stack.push((next, 0));
                }
                Mark::InProgress => {
                    return Err(GraphIntegrityError::Cycle {
                        node: stages[next].0.clone(),
                    });
                }
                Mark::Done => {}
            }
        } else {
            marks[node] = Mark::Done;
            post_order.push(node);
            stack.pop();
        }
    }

    if let Some(orphan) = marks.iter().position(|m| *m == Mark::Unvisited) {
        return Err(GraphIntegrityError::Unreachable {
            node: stages[orphan].0.clone(),
        });
    }

    post_order.reverse();
    Ok(post_order)
}

/// Checks that every stage read and every condition field is guaranteed to be
/// present: declared as input, defaulted, or written on every path reaching it.
fn check_field_availability(
    inputs: &[FieldName],
    defaults: &[(FieldName, FieldValue)],
    nodes: &[CompiledNode],
    edges: &[Edge],
    successors: &[Vec<usize>],
    order: &[usize],
) -> Result<(), GraphIntegrityError> {
    let base: BTreeSet<FieldName> = inputs
        .iter()
        .cloned()
        .chain(defaults.iter().map(|(field, _)| field.clone()))
        .collect();

    // Fields guaranteed on entry to each node: the intersection over all
    // predecessors of what they guarantee on exit.
    let mut available_before: Vec<Option<BTreeSet<FieldName>>> = vec![None; nodes.len()];
    if let Some(&first) = order.first() {
        available_before[first] = Some(base);
    }

    for &index in order {
        let node = &nodes[index];
        let before = available_before[index].clone().unwrap_or_default();

        if let Some(field) = node
            .stage
            .reads()
            .into_iter()
            .find(|field| !before.contains(field))
        {
            return Err(GraphIntegrityError::UnavailableField {
                node: node.id.clone(),
                field,
            });
        }

        let after: BTreeSet<FieldName> = before.union(&node.writes).cloned().collect();

        if let Some(condition) = edges[index].condition() {
            if !after.contains(condition.field()) {
                return Err(GraphIntegrityError::UnavailableConditionField {
                    node: node.id.clone(),
                    field: condition.field().clone(),
                });
            }
        }

        for &next in &successors[index] {
            let merged = match available_before[next].take() {
                Some(existing) => existing.intersection(&after).cloned().collect(),
                None => after.clone(),
            };
            available_before[next] = Some(merged);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

impl CompiledPipeline {
    /// The pipeline name.
    pub fn name(&self) -> &PipelineName {
        &self.name
    }

    /// The entry node.
    pub fn entry(&self) -> &NodeId {
        &self.nodes[self.entry].id
    }

    /// All nodes in a topological order starting with the entry node.
    pub fn topological_order(&self) -> Vec<&NodeId> {
        self.order.iter().map(|&i| &self.nodes[i].id).collect()
    }

    /// Runs the pipeline once over `initial`.
    ///
    /// `initial` is never modified; defaults are seeded into a private copy
    /// for fields it lacks.
    ///
    /// # Errors
    ///
    /// - [`RunError::MissingInput`] if `initial` lacks a declared input.
    /// - [`RunError::UndeclaredWrite`] if a stage writes outside its declared
    ///   output set.
    /// - [`RunError::MissingWrite`] if a stage leaves a declared output
    ///   unwritten.
    pub async fn run(&self, initial: &RunState) -> Result<RunReport, RunError> {
        let run_id = PipelineRunId::new_random();
        let span = info_span!("pipeline_run", pipeline = %self.name, run_id = %run_id);
        self.walk(run_id, initial).instrument(span).await
    }

    async fn walk(&self, run_id: PipelineRunId, initial: &RunState) -> Result<RunReport, RunError> {
        if let Some(field) = self.inputs.iter().find(|f| !initial.contains(f)) {
            return Err(RunError::MissingInput {
                field: field.clone(),
            });
        }

        let started_at = Timestamp::now();
        let mut state = initial.clone();
        for (field, value) in &self.defaults {
            state.insert_absent(field, value);
        }

        let mut visits = Vec::new();
        let mut step = Step::Node(self.entry);

        while let Step::Node(index) = step {
            let node = &self.nodes[index];
            debug!(node = %node.id, "running stage");

            let clock = Instant::now();
            let update = node.stage.run(&state).await;
            let latency_ms = u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);

            if let Some(field) = update.fields().find(|f| !node.writes.contains(*f)) {
                return Err(RunError::UndeclaredWrite {
                    node: node.id.clone(),
                    field: field.clone(),
                });
            }
            if let Some(field) = node.writes.iter().find(|f| !update.contains(f)) {
                return Err(RunError::MissingWrite {
                    node: node.id.clone(),
                    field: field.clone(),
                });
            }

            state = state.merged(update);
            visits.push(StageVisit {
                node: node.id.clone(),
                latency_ms,
            });

            step = node.edge.resolve(&state);
            debug!(
                node = %node.id,
                next = %self.describe(step),
                latency_ms,
                "stage complete"
            );
        }

        info!(stages = visits.len(), "run complete");

        Ok(RunReport {
            run_id,
            pipeline: self.name.clone(),
            state,
            visits,
            started_at,
            finished_at: Timestamp::now(),
        })
    }

    fn describe(&self, step: Step) -> &str {
        match step {
            Step::Node(index) => self.nodes[index].id.as_str(),
            Step::End => "END",
        }
    }
}
