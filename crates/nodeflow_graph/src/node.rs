// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances placed in a graph.

use crate::port::{Port, PortDirection, PortId};
use crate::value::{DataType, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// A placed node instance: one callable unit with typed parameters.
///
/// The node carries one input port per parameter in signature order, and
/// an output port only when the underlying function produces a result.
/// Multiple instances of the same function may coexist in a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Name of the registered function this node invokes
    pub function: String,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the graph canvas, kept for document round-trips
    pub position: [f32; 2],
    /// Input ports, one per parameter, in signature order
    pub inputs: Vec<Port>,
    /// Output port, present only for functions with a return value
    pub output: Option<Port>,
    /// User-supplied parameter defaults, used when an input is unconnected
    pub param_values: IndexMap<String, Value>,
}

impl Node {
    /// Create a node for a function signature.
    ///
    /// `params` is the ordered parameter list; `output` is the result type
    /// if the function produces one.
    pub fn new(
        function: impl Into<String>,
        params: &[(&str, DataType)],
        output: Option<DataType>,
    ) -> Self {
        let function = function.into();
        Self {
            id: NodeId::new(),
            name: function.clone(),
            function,
            position: [0.0, 0.0],
            inputs: params
                .iter()
                .map(|(name, ty)| Port::input(*name, *ty))
                .collect(),
            output: output.map(|ty| Port::output("output", ty)),
            param_values: IndexMap::new(),
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set a parameter default
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.param_values.insert(name.into(), value.into());
        self
    }

    /// Store a parameter default, replacing any previous value.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.param_values.insert(name.into(), value.into());
    }

    /// Get an input port by parameter name
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    /// Get a port by ID
    pub fn port(&self, port_id: PortId) -> Option<&Port> {
        self.inputs
            .iter()
            .find(|p| p.id == port_id)
            .or_else(|| self.output.as_ref().filter(|p| p.id == port_id))
    }

    /// Get a port by name and direction
    pub fn port_named(&self, name: &str, direction: PortDirection) -> Option<&Port> {
        match direction {
            PortDirection::Input => self.input(name),
            PortDirection::Output => self.output.as_ref().filter(|p| p.name == name),
        }
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.output.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_follow_signature() {
        let node = Node::new("add", &[("a", DataType::Int), ("b", DataType::Int)], Some(DataType::Int));
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.inputs[0].name, "a");
        assert!(node.output.is_some());

        let sink = Node::new("print", &[("data", DataType::Any)], None);
        assert!(sink.output.is_none());
    }

    #[test]
    fn test_port_lookup() {
        let node = Node::new("add", &[("a", DataType::Int), ("b", DataType::Int)], Some(DataType::Int));
        let a = node.input("a").unwrap();
        assert_eq!(node.port(a.id).unwrap().name, "a");
        assert!(node.port_named("output", PortDirection::Output).is_some());
        assert!(node.port_named("c", PortDirection::Input).is_none());
    }
}
