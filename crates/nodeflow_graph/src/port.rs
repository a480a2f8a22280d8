// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::value::DataType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub Uuid);

impl PortId {
    /// Create a new random port ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port (one per parameter)
    Input,
    /// Output port (at most one per node)
    Output,
}

/// A typed attachment point on a node.
///
/// Input ports accept at most one incoming connection; output ports may
/// drive any number of outgoing connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Unique port ID
    pub id: PortId,
    /// Port name (the parameter name for inputs, `"output"` for outputs)
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Semantic type tag inherited from the node's signature
    pub data_type: DataType,
}

impl Port {
    /// Create a new input port
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Input,
            data_type,
        }
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: PortId::new(),
            name: name.into(),
            direction: PortDirection::Output,
            data_type,
        }
    }

    /// Check if a connection from this port to another port is valid.
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        self.data_type.can_connect_to(&other.data_type)
    }
}
