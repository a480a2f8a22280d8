// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for node execution.

use nodeflow_graph::{DataType, NodeId};

/// Error raised by a node's function body.
///
/// Functions report failure with a plain message; the executor attaches
/// the owning node's identity when it records the failure.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct NodeError(pub String);

impl NodeError {
    /// Create a new node error
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for NodeError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for NodeError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// A node-scoped execution failure.
///
/// Every variant names the node it is attributed to; the executor records
/// these in the run report rather than letting them abort the run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    /// An input has neither an incoming connection nor a usable default
    #[error("node {node:?}: no value for parameter '{param}'")]
    MissingInput {
        /// The node whose input is unresolved
        node: NodeId,
        /// The parameter name
        param: String,
    },

    /// A stored default could not be parsed into the port's declared type
    #[error("node {node:?}: parameter '{param}' expects {expected}, stored default is {got}")]
    TypeCoercion {
        /// The node whose default failed to parse
        node: NodeId,
        /// The parameter name
        param: String,
        /// The port's declared type
        expected: DataType,
        /// The type of the stored default
        got: DataType,
    },

    /// The node's function returned an error
    #[error("node {node:?} failed: {message}")]
    NodeFailed {
        /// The node that failed
        node: NodeId,
        /// The function's error message
        message: String,
    },

    /// The node references a function missing from the registry
    #[error("node {node:?}: no registered function named '{function}'")]
    UnknownFunction {
        /// The node with the dangling reference
        node: NodeId,
        /// The unresolved function name
        function: String,
    },
}

impl ExecutionError {
    /// The node this error is attributed to.
    pub fn node(&self) -> NodeId {
        match self {
            Self::MissingInput { node, .. }
            | Self::TypeCoercion { node, .. }
            | Self::NodeFailed { node, .. }
            | Self::UnknownFunction { node, .. } => *node,
        }
    }
}
