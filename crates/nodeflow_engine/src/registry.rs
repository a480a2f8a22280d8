// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node registry: named functions with typed parameter signatures.
//!
//! The registry is an explicit, passed-in object. Nothing in the engine
//! reads process-wide state, so tests can run against a synthetic
//! registry containing only the definitions they need.

use crate::error::NodeError;
use crate::sink::NodeSink;
use indexmap::IndexMap;
use nodeflow_graph::{DataType, Node, Value};
use std::sync::Arc;

/// Resolved keyword arguments handed to a node function.
///
/// Values are already coerced to the declared parameter types, in
/// signature order.
#[derive(Debug, Clone, Default)]
pub struct Args(IndexMap<String, Value>);

impl Args {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an argument
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Get an argument by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Get an argument, failing if absent.
    pub fn require(&self, name: &str) -> Result<&Value, NodeError> {
        self.get(name)
            .ok_or_else(|| NodeError::new(format!("missing argument '{name}'")))
    }

    /// Get an integer argument, accepting whole floats.
    pub fn int(&self, name: &str) -> Result<i64, NodeError> {
        match self.require(name)? {
            Value::Int(i) => Ok(*i),
            Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
            other => Err(NodeError::new(format!(
                "argument '{name}' is {}, expected int",
                other.data_type()
            ))),
        }
    }

    /// Get a float argument, accepting integers.
    pub fn float(&self, name: &str) -> Result<f64, NodeError> {
        match self.require(name)? {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(NodeError::new(format!(
                "argument '{name}' is {}, expected float",
                other.data_type()
            ))),
        }
    }

    /// Get a string argument.
    pub fn str(&self, name: &str) -> Result<&str, NodeError> {
        match self.require(name)? {
            Value::Str(s) => Ok(s),
            other => Err(NodeError::new(format!(
                "argument '{name}' is {}, expected string",
                other.data_type()
            ))),
        }
    }

    /// Iterate over arguments in signature order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A node function: named arguments in, optional result out.
///
/// Output-only nodes return `Ok(None)` and push anything user-visible
/// through the sink.
pub type NodeFn =
    Arc<dyn Fn(&Args, &mut NodeSink) -> Result<Option<Value>, NodeError> + Send + Sync>;

/// A registered node definition: signature plus the function it invokes.
#[derive(Clone)]
pub struct NodeDefinition {
    /// Unique function name
    pub name: String,
    /// Library category ("constants", "math", "output", ...)
    pub category: String,
    /// Human-readable description
    pub description: String,
    /// Ordered parameter signature
    pub params: IndexMap<String, DataType>,
    /// Signature-level parameter defaults
    pub defaults: IndexMap<String, Value>,
    /// Result type, if the function produces one
    pub returns: Option<DataType>,
    /// The function to invoke
    pub function: NodeFn,
}

impl std::fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

impl NodeDefinition {
    /// Create a definition with no parameters and no result.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        function: NodeFn,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            description: description.into(),
            params: IndexMap::new(),
            defaults: IndexMap::new(),
            returns: None,
            function,
        }
    }

    /// Append a parameter to the signature
    pub fn with_param(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.params.insert(name.into(), data_type);
        self
    }

    /// Set a parameter's signature-level default
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Declare the result type
    pub fn with_output(mut self, data_type: DataType) -> Self {
        self.returns = Some(data_type);
        self
    }

    /// Instantiate a node carrying this definition's signature.
    ///
    /// The node gets one input port per parameter, an output port when the
    /// definition returns a value, and a copy of the signature defaults as
    /// its initial parameter values.
    pub fn instantiate(&self) -> Node {
        let params: Vec<(&str, DataType)> = self
            .params
            .iter()
            .map(|(name, ty)| (name.as_str(), *ty))
            .collect();
        let mut node = Node::new(self.name.as_str(), &params, self.returns);
        node.param_values = self.defaults.clone();
        node
    }
}

/// Registry of available node definitions, keyed by function name.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    definitions: IndexMap<String, NodeDefinition>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any previous one with the same name.
    pub fn register(&mut self, definition: NodeDefinition) {
        self.definitions
            .insert(definition.name.clone(), definition);
    }

    /// Remove a definition by name. Returns false if it was not registered.
    pub fn remove(&mut self, name: &str) -> bool {
        self.definitions.shift_remove(name).is_some()
    }

    /// Get a definition by function name
    pub fn get(&self, name: &str) -> Option<&NodeDefinition> {
        self.definitions.get(name)
    }

    /// All definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.values()
    }

    /// Categories in first-registration order
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for definition in self.definitions.values() {
            if !seen.contains(&definition.category.as_str()) {
                seen.push(definition.category.as_str());
            }
        }
        seen
    }

    /// Definitions in a category, in registration order
    pub fn definitions_in_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a NodeDefinition> {
        self.definitions
            .values()
            .filter(move |d| d.category == category)
    }

    /// Instantiate a node for a registered function name
    pub fn instantiate(&self, name: &str) -> Option<Node> {
        self.get(name).map(NodeDefinition::instantiate)
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// True if no definitions are registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> NodeFn {
        Arc::new(|_, _| Ok(None))
    }

    #[test]
    fn test_instantiate_copies_signature_and_defaults() {
        let definition = NodeDefinition::new("add", "math", "Add two integers", noop())
            .with_param("a", DataType::Int)
            .with_param("b", DataType::Int)
            .with_default("a", 0i64)
            .with_default("b", 0i64)
            .with_output(DataType::Int);

        let node = definition.instantiate();
        assert_eq!(node.function, "add");
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.inputs[0].name, "a");
        assert!(node.output.is_some());
        assert_eq!(node.param_values.get("a"), Some(&Value::Int(0)));

        // Two instances of the same definition get distinct identities
        let other = definition.instantiate();
        assert_ne!(node.id, other.id);
    }

    #[test]
    fn test_categories_keep_first_seen_order() {
        let mut registry = NodeRegistry::new();
        registry.register(NodeDefinition::new("print", "output", "", noop()));
        registry.register(NodeDefinition::new("const_int", "constants", "", noop()));
        registry.register(NodeDefinition::new("type_of", "output", "", noop()));

        assert_eq!(registry.categories(), vec!["output", "constants"]);
        assert_eq!(registry.definitions_in_category("output").count(), 2);
    }

    #[test]
    fn test_register_and_remove() {
        let mut registry = NodeRegistry::new();
        registry.register(NodeDefinition::new("custom", "custom", "", noop()));
        assert!(registry.get("custom").is_some());
        assert!(registry.remove("custom"));
        assert!(!registry.remove("custom"));
        assert!(registry.is_empty());
    }
}
