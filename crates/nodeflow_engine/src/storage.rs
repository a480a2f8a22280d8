// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph document (de)serialization.
//!
//! Graphs are saved as a JSON document with top-level `nodes`,
//! `connections`, and `groups` keys. Connection endpoints are recorded by
//! node id plus port *name*, so documents survive port-id regeneration.
//! Materializing a document needs the registry: node records reference
//! functions by name and take their signatures from the registered
//! definitions.

use crate::registry::NodeRegistry;
use indexmap::IndexMap;
use nodeflow_graph::{Graph, NodeGroup, NodeId, PortDirection, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A node record in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node instance id
    pub id: NodeId,
    /// Registered function name
    #[serde(rename = "type")]
    pub function: String,
    /// Canvas position
    #[serde(default)]
    pub x: f32,
    /// Canvas position
    #[serde(default)]
    pub y: f32,
    /// Stored parameter defaults
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

/// A connection record in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Source node id
    pub from_node: NodeId,
    /// Source port name (`"output"`)
    pub from_port: String,
    /// Target node id
    pub to_node: NodeId,
    /// Target port name (the parameter name)
    pub to_port: String,
}

/// A group record in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group display name
    pub name: String,
    /// Member node ids
    pub node_ids: Vec<NodeId>,
}

/// Serialized form of a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDoc {
    /// Graph name
    #[serde(default)]
    pub name: String,
    /// Node records
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Connection records
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
    /// Group records
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

impl GraphDoc {
    /// Export a graph into document form.
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes()
            .map(|node| NodeRecord {
                id: node.id,
                function: node.function.clone(),
                x: node.position[0],
                y: node.position[1],
                params: node.param_values.clone(),
            })
            .collect();

        let connections = graph
            .connections()
            .filter_map(|connection| {
                let from = graph.node(connection.from_node)?.port(connection.from_port)?;
                let to = graph.node(connection.to_node)?.port(connection.to_port)?;
                Some(ConnectionRecord {
                    from_node: connection.from_node,
                    from_port: from.name.clone(),
                    to_node: connection.to_node,
                    to_port: to.name.clone(),
                })
            })
            .collect();

        let groups = graph
            .groups()
            .iter()
            .map(|group| GroupRecord {
                name: group.name.clone(),
                node_ids: group.nodes.clone(),
            })
            .collect();

        Self {
            name: graph.name.clone(),
            nodes,
            connections,
            groups,
        }
    }

    /// Materialize the document into a graph.
    ///
    /// Records referencing functions missing from the registry, unknown
    /// nodes, or unknown ports are skipped with a warning, matching the
    /// editor's load behavior for documents written by a newer library.
    pub fn into_graph(&self, registry: &NodeRegistry) -> Graph {
        let mut graph = Graph::new(self.name.clone());

        for record in &self.nodes {
            let Some(mut node) = registry.instantiate(&record.function) else {
                tracing::warn!(
                    function = %record.function,
                    "skipping node with unregistered function"
                );
                continue;
            };
            node.id = record.id;
            node.position = [record.x, record.y];
            for (name, value) in &record.params {
                node.set_param(name, value.clone());
            }
            graph.add_node(node);
        }

        for record in &self.connections {
            let endpoints = graph.node(record.from_node).zip(graph.node(record.to_node));
            let Some((from_node, to_node)) = endpoints else {
                tracing::warn!("skipping connection with missing endpoint node");
                continue;
            };
            let from = from_node.port_named(&record.from_port, PortDirection::Output);
            let to = to_node.port_named(&record.to_port, PortDirection::Input);
            let (Some(from), Some(to)) = (from, to) else {
                tracing::warn!(
                    from = %record.from_port,
                    to = %record.to_port,
                    "skipping connection with missing port"
                );
                continue;
            };
            let (from, to) = (from.id, to.id);
            if let Err(err) = graph.connect(record.from_node, from, record.to_node, to) {
                tracing::warn!(error = %err, "skipping invalid connection");
            }
        }

        for record in &self.groups {
            let members: Vec<NodeId> = record
                .node_ids
                .iter()
                .copied()
                .filter(|id| graph.node(*id).is_some())
                .collect();
            if !members.is_empty() {
                graph.add_group(NodeGroup {
                    name: record.name.clone(),
                    nodes: members,
                });
            }
        }

        graph
    }
}

/// Error reading or writing a graph document.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem error
    #[error("graph file i/o: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed document
    #[error("graph document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a graph document from a JSON file.
pub fn load_doc(path: impl AsRef<Path>) -> Result<GraphDoc, StorageError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Save a graph document to a JSON file, pretty-printed.
pub fn save_doc(doc: &GraphDoc, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let text = serde_json::to_string_pretty(doc)?;
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::builtin_registry;

    fn sample_graph(registry: &NodeRegistry) -> Graph {
        let mut graph = Graph::new("sample");
        let mut constant = registry.instantiate("const_int").unwrap();
        constant.set_param("value", 5i64);
        let constant = graph.add_node(constant.with_position(10.0, 20.0));
        let print = graph.add_node(registry.instantiate("print").unwrap());

        let from = graph.node(constant).unwrap().output.as_ref().unwrap().id;
        let to = graph.node(print).unwrap().input("data").unwrap().id;
        graph.connect(constant, from, print, to).unwrap();
        graph.add_group(NodeGroup {
            name: "pipeline".to_string(),
            nodes: vec![constant, print],
        });
        graph
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let registry = builtin_registry();
        let graph = sample_graph(&registry);

        let doc = GraphDoc::from_graph(&graph);
        let restored = doc.into_graph(&registry);

        assert_eq!(restored.name, "sample");
        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.connection_count(), 1);
        assert_eq!(restored.groups().len(), 1);

        // Ids, positions, and params survive
        let original_ids: Vec<_> = graph.node_ids().collect();
        let restored_ids: Vec<_> = restored.node_ids().collect();
        assert_eq!(original_ids, restored_ids);
        let constant = restored.node(original_ids[0]).unwrap();
        assert_eq!(constant.position, [10.0, 20.0]);
        assert_eq!(constant.param_values.get("value"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_unknown_function_records_are_skipped() {
        let registry = builtin_registry();
        let doc = GraphDoc {
            name: "doc".to_string(),
            nodes: vec![NodeRecord {
                id: NodeId::new(),
                function: "does_not_exist".to_string(),
                x: 0.0,
                y: 0.0,
                params: IndexMap::new(),
            }],
            connections: Vec::new(),
            groups: Vec::new(),
        };
        let graph = doc.into_graph(&registry);
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_connection_port_names_follow_parameters() {
        let registry = builtin_registry();
        let graph = sample_graph(&registry);
        let doc = GraphDoc::from_graph(&graph);
        assert_eq!(doc.connections[0].from_port, "output");
        assert_eq!(doc.connections[0].to_port, "data");
    }

    #[test]
    fn test_file_round_trip() {
        let registry = builtin_registry();
        let graph = sample_graph(&registry);
        let doc = GraphDoc::from_graph(&graph);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        save_doc(&doc, &path).unwrap();
        let loaded = load_doc(&path).unwrap();
        assert_eq!(loaded.nodes.len(), 2);
        assert_eq!(loaded.into_graph(&registry).connection_count(), 1);
    }
}
