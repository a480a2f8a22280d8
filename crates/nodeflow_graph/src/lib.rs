// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph data model for Nodeflow.
//!
//! This crate provides the structural half of the engine:
//! - Nodes with typed input/output ports
//! - Validated connections (one driver per input, unrestricted fan-out)
//! - Deterministic topological scheduling
//! - Serialization support
//!
//! Execution lives in `nodeflow_engine`; this crate never invokes a
//! node's function.

pub mod connection;
pub mod graph;
pub mod node;
pub mod port;
pub mod value;

pub use connection::{Connection, ConnectionId};
pub use graph::{ConnectionError, Graph, NodeGroup, OrderError};
pub use node::{Node, NodeId};
pub use port::{Port, PortDirection, PortId};
pub use value::{CoercionError, DataType, Value};
