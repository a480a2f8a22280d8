// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered graph execution.
//!
//! Runs every node exactly once, single-threaded, in scheduler order,
//! propagating each computed value along its outgoing connections. A
//! node failure never aborts the process: the failing node is recorded
//! as `Failed`, everything transitively downstream of it is `Skipped`,
//! and independent branches keep running. Only a cycle halts a run
//! before any node executes.

use crate::error::ExecutionError;
use crate::registry::NodeRegistry;
use crate::resolver::resolve_args;
use crate::sink::{NodeSink, Sink};
use indexmap::IndexMap;
use nodeflow_graph::{Graph, NodeId, OrderError, PortId, Value};
use std::collections::{HashMap, HashSet, VecDeque};

/// Terminal status of a node after a run.
///
/// Nodes move from pending through running to exactly one of these;
/// the intermediate states are implicit in the executor loop (a node is
/// running while its function call is on the stack) and only the
/// terminal state is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Finished and produced its result (possibly no value)
    Completed,
    /// Raised an error
    Failed,
    /// Not run: downstream of a failure, or cut off by cancellation
    Skipped,
}

/// Final outcome recorded for a node after a run.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    /// The node ran to completion; output-only nodes carry no value
    Completed(Option<Value>),
    /// The node failed with the given error
    Failed(ExecutionError),
    /// The node was not run
    Skipped,
}

impl NodeOutcome {
    /// The status this outcome corresponds to.
    pub fn status(&self) -> NodeStatus {
        match self {
            Self::Completed(_) => NodeStatus::Completed,
            Self::Failed(_) => NodeStatus::Failed,
            Self::Skipped => NodeStatus::Skipped,
        }
    }
}

/// Per-node results of a run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    outcomes: IndexMap<NodeId, NodeOutcome>,
    cancelled: bool,
}

impl RunReport {
    /// The outcome recorded for a node
    pub fn outcome(&self, node: NodeId) -> Option<&NodeOutcome> {
        self.outcomes.get(&node)
    }

    /// The value a node completed with, if any
    pub fn value(&self, node: NodeId) -> Option<&Value> {
        match self.outcomes.get(&node) {
            Some(NodeOutcome::Completed(value)) => value.as_ref(),
            _ => None,
        }
    }

    /// All outcomes in execution order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeOutcome)> {
        self.outcomes.iter().map(|(&id, outcome)| (id, outcome))
    }

    /// Failures recorded during the run, in execution order
    pub fn failures(&self) -> impl Iterator<Item = &ExecutionError> {
        self.outcomes.values().filter_map(|outcome| match outcome {
            NodeOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    /// True if the run was cut short by the cancellation check
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// True if every node completed and the run was not cancelled
    pub fn succeeded(&self) -> bool {
        !self.cancelled
            && self
                .outcomes
                .values()
                .all(|o| matches!(o, NodeOutcome::Completed(_)))
    }

    fn record(&mut self, node: NodeId, outcome: NodeOutcome) {
        self.outcomes.insert(node, outcome);
    }
}

/// Executes graphs against a node registry.
pub struct Executor<'r> {
    registry: &'r NodeRegistry,
}

impl<'r> Executor<'r> {
    /// Create an executor over the given registry
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Run a graph to completion.
    ///
    /// Returns `Err` only for a cyclic graph; node-scoped failures are
    /// reported through the [`RunReport`].
    pub fn run(&self, graph: &Graph, sink: &mut dyn Sink) -> Result<RunReport, OrderError> {
        self.run_inner(graph, sink, None)
    }

    /// Run a graph with a cooperative cancellation check.
    ///
    /// The check is invoked between node invocations, never mid-node.
    /// Once it returns true, all not-yet-run nodes are marked `Skipped`.
    pub fn run_with_cancel(
        &self,
        graph: &Graph,
        sink: &mut dyn Sink,
        cancel: &mut dyn FnMut() -> bool,
    ) -> Result<RunReport, OrderError> {
        self.run_inner(graph, sink, Some(cancel))
    }

    fn run_inner(
        &self,
        graph: &Graph,
        sink: &mut dyn Sink,
        mut cancel: Option<&mut dyn FnMut() -> bool>,
    ) -> Result<RunReport, OrderError> {
        let order = graph.topological_order()?;
        tracing::info!(
            graph = %graph.name,
            nodes = order.len(),
            "starting graph run"
        );

        let mut report = RunReport::default();
        let mut outputs: HashMap<PortId, Value> = HashMap::new();
        let mut skipped: HashSet<NodeId> = HashSet::new();

        for (index, &node_id) in order.iter().enumerate() {
            if let Some(check) = cancel.as_mut() {
                if check() {
                    tracing::warn!(graph = %graph.name, "run cancelled");
                    report.cancelled = true;
                    for &rest in &order[index..] {
                        report.record(rest, NodeOutcome::Skipped);
                    }
                    break;
                }
            }

            if skipped.contains(&node_id) {
                report.record(node_id, NodeOutcome::Skipped);
                continue;
            }

            // Scheduler order guarantees the node exists and all of its
            // upstream nodes already have an outcome.
            let Some(node) = graph.node(node_id) else {
                continue;
            };

            tracing::info!(node = %node.name, "executing node");

            let outcome = match self.execute_node(graph, node, &outputs, sink) {
                Ok(value) => {
                    if let (Some(port), Some(value)) = (&node.output, &value) {
                        outputs.insert(port.id, value.clone());
                    }
                    match &value {
                        Some(value) => {
                            tracing::info!(node = %node.name, result = %value, "node completed");
                        }
                        None => tracing::info!(node = %node.name, "node completed"),
                    }
                    NodeOutcome::Completed(value)
                }
                Err(err) => {
                    tracing::error!(node = %node.name, error = %err, "node failed");
                    mark_downstream(graph, node_id, &mut skipped);
                    NodeOutcome::Failed(err)
                }
            };
            report.record(node_id, outcome);
        }

        if report.succeeded() {
            tracing::info!(graph = %graph.name, "run finished");
        } else {
            tracing::warn!(
                graph = %graph.name,
                failures = report.failures().count(),
                cancelled = report.cancelled,
                "run finished with errors"
            );
        }
        Ok(report)
    }

    fn execute_node(
        &self,
        graph: &Graph,
        node: &nodeflow_graph::Node,
        outputs: &HashMap<PortId, Value>,
        sink: &mut dyn Sink,
    ) -> Result<Option<Value>, ExecutionError> {
        let definition =
            self.registry
                .get(&node.function)
                .ok_or_else(|| ExecutionError::UnknownFunction {
                    node: node.id,
                    function: node.function.clone(),
                })?;

        let args = resolve_args(graph, node, outputs)?;

        let mut node_sink = NodeSink::new(node.id, sink);
        (definition.function)(&args, &mut node_sink).map_err(|err| ExecutionError::NodeFailed {
            node: node.id,
            message: err.to_string(),
        })
    }
}

/// Mark every node reachable from `from` through outgoing connections.
fn mark_downstream(graph: &Graph, from: NodeId, skipped: &mut HashSet<NodeId>) {
    let mut queue = VecDeque::from([from]);
    while let Some(current) = queue.pop_front() {
        for connection in graph.connections_for_node(current) {
            if connection.from_node == current && skipped.insert(connection.to_node) {
                queue.push_back(connection.to_node);
            }
        }
    }
}
