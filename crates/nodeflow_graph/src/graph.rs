// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes, connections, and group metadata.

use crate::connection::{Connection, ConnectionId};
use crate::node::{Node, NodeId};
use crate::port::{PortDirection, PortId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// A named set of nodes, used purely as canvas metadata.
///
/// Groups are persisted with the graph but have no effect on scheduling
/// or execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGroup {
    /// Group display name
    pub name: String,
    /// Member node IDs
    pub nodes: Vec<NodeId>,
}

/// A node graph: placed nodes plus the connections between their ports.
///
/// Node and connection tables are insertion-ordered, which is what makes
/// scheduling deterministic for a given graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Connections between nodes
    connections: IndexMap<ConnectionId, Connection>,
    /// Node groups (canvas metadata only)
    groups: Vec<NodeGroup>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            groups: Vec::new(),
        }
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node, its connections, and its group memberships.
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        self.connections.retain(|_, c| !c.involves_node(node_id));
        for group in &mut self.groups {
            group.nodes.retain(|&id| id != node_id);
        }
        self.groups.retain(|g| !g.nodes.is_empty());
        // shift_remove keeps the insertion order of the remaining nodes
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect an output port to an input port.
    ///
    /// Validates that both endpoints exist, that the direction is
    /// output-to-input, that the port types are compatible, that the input
    /// is not already driven, and that the edge is not a self-loop.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: PortId,
        to_node: NodeId,
        to_port: PortId,
    ) -> Result<ConnectionId, ConnectionError> {
        let source_node = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_port = source_node
            .port(from_port)
            .ok_or(ConnectionError::PortNotFound(from_port))?;
        let target_port = target_node
            .port(to_port)
            .ok_or(ConnectionError::PortNotFound(to_port))?;

        if source_port.direction != PortDirection::Output
            || target_port.direction != PortDirection::Input
        {
            return Err(ConnectionError::WrongDirection);
        }

        if !source_port.can_connect(target_port) {
            return Err(ConnectionError::IncompatiblePorts {
                from: source_port.data_type,
                to: target_port.data_type,
            });
        }

        // An input port accepts at most one incoming connection
        if self.connections.values().any(|c| c.to_port == to_port) {
            return Err(ConnectionError::PortAlreadyConnected(to_port));
        }

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let connection = Connection::new(from_node, from_port, to_node, to_port);
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    /// Remove a connection
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Option<Connection> {
        self.connections.shift_remove(&connection_id)
    }

    /// Get a connection by ID
    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }

    /// Get all connections in insertion order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the connection feeding an input port, if any
    pub fn connection_to(&self, port_id: PortId) -> Option<&Connection> {
        self.connections.values().find(|c| c.to_port == port_id)
    }

    /// Get connections leaving an output port
    pub fn connections_from(&self, port_id: PortId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.from_port == port_id)
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Add a node group
    pub fn add_group(&mut self, group: NodeGroup) {
        self.groups.push(group);
    }

    /// Get all node groups
    pub fn groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    /// Compute a dependency-respecting execution order over all nodes.
    ///
    /// Incoming-edge counting (Kahn's algorithm): the ready queue is seeded
    /// and drained in node insertion order, so ties between simultaneously
    /// ready nodes break the same way on every run. Every connection's
    /// source precedes its target in the returned sequence.
    pub fn topological_order(&self) -> Result<Vec<NodeId>, OrderError> {
        let mut in_degree: IndexMap<NodeId, usize> =
            self.nodes.keys().map(|&id| (id, 0)).collect();
        for connection in self.connections.values() {
            if let Some(count) = in_degree.get_mut(&connection.to_node) {
                *count += 1;
            }
        }

        let mut ready: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(node_id) = ready.pop_front() {
            order.push(node_id);
            for connection in self.connections.values() {
                if connection.from_node != node_id {
                    continue;
                }
                let Some(count) = in_degree.get_mut(&connection.to_node) else {
                    continue;
                };
                *count -= 1;
                if *count == 0 {
                    ready.push_back(connection.to_node);
                }
            }
        }

        if let Some(node) = self.find_cycle_member(&in_degree) {
            return Err(OrderError::CycleDetected { node });
        }

        Ok(order)
    }

    /// Find a node that is actually on a cycle, given the residual
    /// in-degrees left behind by a Kahn pass. Returns `None` when every
    /// node was resolved (the graph is acyclic).
    ///
    /// Every leftover node (residual in-degree > 0) still has an incoming
    /// connection from another leftover node, so walking incoming
    /// connections within the leftover set must eventually revisit a
    /// node, and the revisited node is on a cycle. Nodes that are merely
    /// downstream of the cycle are walked through, never reported.
    fn find_cycle_member(&self, in_degree: &IndexMap<NodeId, usize>) -> Option<NodeId> {
        let leftover: HashSet<NodeId> = in_degree
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&id, _)| id)
            .collect();

        let mut current = in_degree
            .iter()
            .find(|(_, &count)| count > 0)
            .map(|(&id, _)| id)?;

        let mut visited = HashSet::new();
        while visited.insert(current) {
            if let Some(connection) = self
                .connections
                .values()
                .find(|c| c.to_node == current && leftover.contains(&c.from_node))
            {
                current = connection.from_node;
            }
        }

        Some(current)
    }
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("port not found: {0:?}")]
    PortNotFound(PortId),

    /// Connections run from an output port to an input port
    #[error("connections must run from an output port to an input port")]
    WrongDirection,

    /// Incompatible port types
    #[error("incompatible port types: {from} -> {to}")]
    IncompatiblePorts {
        /// Source port type
        from: crate::value::DataType,
        /// Target port type
        to: crate::value::DataType,
    },

    /// Input port is already driven by another connection
    #[error("input port already connected: {0:?}")]
    PortAlreadyConnected(PortId),

    /// Self-loop not allowed
    #[error("a node cannot feed its own input")]
    SelfLoop,
}

/// Error when computing an execution order
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The graph contains a cycle and cannot be executed
    #[error("graph contains a cycle through node {node:?}")]
    CycleDetected {
        /// A node on (or downstream of) the cycle
        node: NodeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn const_node(name: &str) -> Node {
        Node::new(name, &[("value", DataType::Int)], Some(DataType::Int))
    }

    fn add_node() -> Node {
        Node::new(
            "add",
            &[("a", DataType::Int), ("b", DataType::Int)],
            Some(DataType::Int),
        )
    }

    fn out_port(graph: &Graph, id: NodeId) -> PortId {
        graph.node(id).unwrap().output.as_ref().unwrap().id
    }

    fn in_port(graph: &Graph, id: NodeId, name: &str) -> PortId {
        graph.node(id).unwrap().input(name).unwrap().id
    }

    #[test]
    fn test_connect_validates_endpoints() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(const_node("a"));
        let b = graph.add_node(add_node());

        let a_out = out_port(&graph, a);
        let b_in = in_port(&graph, b, "a");

        graph.connect(a, a_out, b, b_in).unwrap();
        assert_eq!(graph.connection_count(), 1);

        // Second edge into the same input is rejected
        let err = graph.connect(a, a_out, b, b_in).unwrap_err();
        assert!(matches!(err, ConnectionError::PortAlreadyConnected(_)));
    }

    #[test]
    fn test_connect_rejects_input_as_source() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(add_node());
        let b = graph.add_node(add_node());

        let a_in = in_port(&graph, a, "a");
        let b_in = in_port(&graph, b, "a");
        let err = graph.connect(a, a_in, b, b_in).unwrap_err();
        assert!(matches!(err, ConnectionError::WrongDirection));
    }

    #[test]
    fn test_connect_rejects_self_loop() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(add_node());
        let a_out = out_port(&graph, a);
        let a_in = in_port(&graph, a, "a");
        let err = graph.connect(a, a_out, a, a_in).unwrap_err();
        assert!(matches!(err, ConnectionError::SelfLoop));
    }

    #[test]
    fn test_connect_rejects_type_mismatch() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(Node::new("text", &[], Some(DataType::Str)));
        let b = graph.add_node(add_node());
        let a_out = out_port(&graph, a);
        let b_in = in_port(&graph, b, "a");
        let err = graph.connect(a, a_out, b, b_in).unwrap_err();
        assert!(matches!(err, ConnectionError::IncompatiblePorts { .. }));
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(const_node("a"));
        let b = graph.add_node(add_node());
        let c = graph.add_node(add_node());

        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b, "a"))
            .unwrap();
        graph
            .connect(b, out_port(&graph, b), c, in_port(&graph, c, "a"))
            .unwrap();

        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn test_topological_order_is_stable_for_ready_ties() {
        let mut graph = Graph::new("test");
        let c = graph.add_node(const_node("c"));
        let a = graph.add_node(const_node("a"));
        let b = graph.add_node(const_node("b"));

        // All three are ready at once; ties break by insertion order.
        let order = graph.topological_order().unwrap();
        assert_eq!(order, vec![c, a, b]);
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(add_node());
        let b = graph.add_node(add_node());

        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b, "a"))
            .unwrap();
        graph
            .connect(b, out_port(&graph, b), a, in_port(&graph, a, "a"))
            .unwrap();

        let err = graph.topological_order().unwrap_err();
        let OrderError::CycleDetected { node } = err;
        assert!(node == a || node == b);
    }

    #[test]
    fn test_cycle_report_names_a_cycle_member_not_a_downstream_node() {
        let mut graph = Graph::new("test");
        // Downstream node first in insertion order, so a naive "first
        // leftover" report would name it instead of the cycle.
        let d = graph.add_node(add_node());
        let a = graph.add_node(add_node());
        let b = graph.add_node(add_node());

        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b, "a"))
            .unwrap();
        graph
            .connect(b, out_port(&graph, b), a, in_port(&graph, a, "a"))
            .unwrap();
        graph
            .connect(a, out_port(&graph, a), d, in_port(&graph, d, "a"))
            .unwrap();

        let OrderError::CycleDetected { node } = graph.topological_order().unwrap_err();
        assert_ne!(node, d, "reported node is only downstream of the cycle");
        assert!(node == a || node == b);
    }

    #[test]
    fn test_remove_node_drops_connections_and_group_membership() {
        let mut graph = Graph::new("test");
        let a = graph.add_node(const_node("a"));
        let b = graph.add_node(add_node());
        graph
            .connect(a, out_port(&graph, a), b, in_port(&graph, b, "a"))
            .unwrap();
        graph.add_group(NodeGroup {
            name: "group".to_string(),
            nodes: vec![a],
        });

        graph.remove_node(a);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.groups().is_empty());
        assert_eq!(graph.node_count(), 1);
    }
}
