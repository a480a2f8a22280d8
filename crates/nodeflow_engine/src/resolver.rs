// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parameter resolution: turning ports into keyword arguments.

use crate::error::ExecutionError;
use crate::registry::Args;
use nodeflow_graph::{Graph, Node, PortId, Value};
use std::collections::HashMap;

/// Build the arguments for a node that is about to execute.
///
/// For each input port in signature order: a connected port takes the
/// already-computed value of its driving output; an unconnected port
/// falls back to the node's stored default, coerced to the port's
/// declared type. A port with neither is a [`ExecutionError::MissingInput`].
pub fn resolve_args(
    graph: &Graph,
    node: &Node,
    outputs: &HashMap<PortId, Value>,
) -> Result<Args, ExecutionError> {
    let mut args = Args::new();

    for port in &node.inputs {
        if let Some(connection) = graph.connection_to(port.id) {
            // Upstream nodes are Completed by scheduler order, so a hole
            // here means the source produced no value for its output port.
            let value = outputs.get(&connection.from_port).ok_or_else(|| {
                ExecutionError::MissingInput {
                    node: node.id,
                    param: port.name.clone(),
                }
            })?;
            tracing::debug!(
                node = %node.name,
                param = %port.name,
                %value,
                "argument from upstream connection"
            );
            args.insert(&port.name, value.clone());
            continue;
        }

        let default = node
            .param_values
            .get(&port.name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| ExecutionError::MissingInput {
                node: node.id,
                param: port.name.clone(),
            })?;

        let coerced =
            default
                .coerce(port.data_type)
                .map_err(|err| ExecutionError::TypeCoercion {
                    node: node.id,
                    param: port.name.clone(),
                    expected: err.expected,
                    got: err.got,
                })?;
        tracing::debug!(
            node = %node.name,
            param = %port.name,
            value = %coerced,
            "argument from stored default"
        );
        args.insert(&port.name, coerced);
    }

    Ok(args)
}
