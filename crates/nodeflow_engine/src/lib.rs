// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution engine for Nodeflow.
//!
//! Takes a graph from `nodeflow_graph` plus a registry of named node
//! functions, and runs every node exactly once in dependency order:
//! - Scheduling: deterministic topological order (cycles abort the run)
//! - Parameter resolution: connected value, else type-coerced default
//! - Invocation: single-threaded, one node at a time, failures recorded
//!   per node and propagated as skips, never as process faults
//!
//! The registry is always passed in explicitly; there is no global node
//! library.

pub mod error;
pub mod executor;
pub mod library;
pub mod registry;
pub mod resolver;
pub mod sink;
pub mod storage;

pub use error::{ExecutionError, NodeError};
pub use executor::{Executor, NodeOutcome, NodeStatus, RunReport};
pub use library::builtin_registry;
pub use registry::{Args, NodeDefinition, NodeFn, NodeRegistry};
pub use resolver::resolve_args;
pub use sink::{ConsoleSink, NodeSink, Sink, VecSink};
pub use storage::{load_doc, save_doc, GraphDoc, StorageError};
