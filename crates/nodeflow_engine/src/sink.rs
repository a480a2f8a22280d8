// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observation sinks for node output.
//!
//! Output-only nodes (print, type inspection) emit values somewhere the
//! user can see them. The engine sequences those emissions but never
//! interprets them; callers choose where they land.

use nodeflow_graph::{NodeId, Value};

/// Receiver for values emitted by output-only nodes.
pub trait Sink {
    /// Record a value emitted by the given node.
    fn emit(&mut self, node: NodeId, value: Value);
}

/// A sink bound to the node currently executing.
///
/// Node functions do not know their own instance identity; the executor
/// hands them one of these so every emission is attributed correctly.
pub struct NodeSink<'a> {
    node: NodeId,
    sink: &'a mut dyn Sink,
}

impl<'a> NodeSink<'a> {
    /// Bind a sink to a node
    pub fn new(node: NodeId, sink: &'a mut dyn Sink) -> Self {
        Self { node, sink }
    }

    /// Emit a value, attributed to the bound node.
    pub fn emit(&mut self, value: Value) {
        self.sink.emit(self.node, value);
    }
}

/// Sink that logs emissions through `tracing`.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn emit(&mut self, node: NodeId, value: Value) {
        tracing::info!(target: "nodeflow::output", ?node, "{value}");
    }
}

/// Sink that buffers emissions in memory, in emission order.
#[derive(Debug, Default)]
pub struct VecSink {
    /// Emitted values with their originating node
    pub emitted: Vec<(NodeId, Value)>,
}

impl VecSink {
    /// Create a new empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// The emitted values, without node attribution.
    pub fn values(&self) -> Vec<&Value> {
        self.emitted.iter().map(|(_, v)| v).collect()
    }
}

impl Sink for VecSink {
    fn emit(&mut self, node: NodeId, value: Value) {
        self.emitted.push((node, value));
    }
}
