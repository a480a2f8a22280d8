// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library.
//!
//! Constants, integer math, console output, and structured-data
//! extraction. Everything here goes through the same registry surface as
//! user-defined nodes.

use crate::registry::{NodeDefinition, NodeRegistry};
use indexmap::IndexMap;
use nodeflow_graph::{DataType, Value};
use std::sync::Arc;

/// Build a registry containing the built-in node definitions.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    registry.register(
        NodeDefinition::new(
            "add",
            "math",
            "Add two integers",
            Arc::new(|args, _| {
                let a = args.int("a")?;
                let b = args.int("b")?;
                let sum = a
                    .checked_add(b)
                    .ok_or_else(|| format!("integer overflow: {a} + {b}"))?;
                Ok(Some(Value::Int(sum)))
            }),
        )
        .with_param("a", DataType::Int)
        .with_param("b", DataType::Int)
        .with_output(DataType::Int),
    );

    registry.register(
        NodeDefinition::new(
            "print",
            "output",
            "Emit the input value to the observation sink",
            Arc::new(|args, sink| {
                let data = args.require("data")?.clone();
                sink.emit(data);
                Ok(None)
            }),
        )
        .with_param("data", DataType::Any),
    );

    registry.register(
        NodeDefinition::new(
            "type_of",
            "output",
            "Emit the type name of the input value",
            Arc::new(|args, sink| {
                let data = args.require("data")?;
                sink.emit(Value::from(data.data_type().name()));
                Ok(None)
            }),
        )
        .with_param("data", DataType::Any),
    );

    registry.register(constant("const_bool", DataType::Bool, Value::Bool(true)));
    registry.register(constant("const_int", DataType::Int, Value::Int(0)));
    registry.register(constant("const_float", DataType::Float, Value::Float(0.0)));
    registry.register(constant("const_string", DataType::Str, Value::Str(String::new())));
    registry.register(constant("const_list", DataType::List, Value::List(Vec::new())));
    registry.register(constant("const_map", DataType::Map, Value::Map(IndexMap::new())));

    registry.register(
        NodeDefinition::new(
            "extract",
            "data",
            "Look up a dotted path inside structured data",
            Arc::new(|args, _| {
                let data = args.require("data")?;
                let path = args.str("path")?;
                Ok(Some(
                    extract_path(data, path).cloned().unwrap_or(Value::Null),
                ))
            }),
        )
        .with_param("data", DataType::Map)
        .with_param("path", DataType::Str)
        .with_default("path", "")
        .with_output(DataType::Any),
    );

    registry
}

fn constant(name: &str, data_type: DataType, default: Value) -> NodeDefinition {
    NodeDefinition::new(
        name,
        "constants",
        format!("{} constant", data_type.name()),
        Arc::new(|args, _| Ok(Some(args.require("value")?.clone()))),
    )
    .with_param("value", data_type)
    .with_default("value", default)
    .with_output(data_type)
}

/// One step of an extraction path.
#[derive(Debug, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Parse `"items[0].name"` / `"items.0.name"` into path segments.
fn parse_path(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for piece in path.split('.') {
        if piece.is_empty() {
            continue;
        }
        let mut rest = piece;
        // Leading field name, if any, ends at the first bracket
        if let Some(bracket) = rest.find('[') {
            let (key, indexes) = rest.split_at(bracket);
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            rest = indexes;
            for index in rest.split('[').skip(1) {
                if let Some(index) = index.strip_suffix(']') {
                    if let Ok(n) = index.parse() {
                        segments.push(Segment::Index(n));
                    }
                }
            }
        } else if let Ok(n) = rest.parse() {
            segments.push(Segment::Index(n));
        } else {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

/// Walk a path into a value. Missing keys and out-of-range indexes
/// resolve to `None` rather than an error.
fn extract_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = data;
    for segment in parse_path(path) {
        current = match (&segment, current) {
            (Segment::Key(key), Value::Map(entries)) => entries.get(key)?,
            (Segment::Index(n), Value::List(items)) => items.get(*n)?,
            // A numeric path piece doubles as a string key into a map
            (Segment::Index(n), Value::Map(entries)) => entries.get(&n.to_string())?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}
