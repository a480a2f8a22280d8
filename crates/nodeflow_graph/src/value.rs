// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime values and the semantic type tags that flow through ports.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Semantic type tag carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    Str,
    /// Ordered list of values
    List,
    /// String-keyed mapping
    Map,
    /// Any type (for generic nodes)
    Any,
}

impl DataType {
    /// Display name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
        }
    }

    /// Check if a value of this type can flow into a port of `other` type.
    pub fn can_connect_to(&self, other: &DataType) -> bool {
        // Any type can connect to anything
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        if self == other {
            return true;
        }

        // Numeric widening is resolved at execution time
        matches!(
            (self, other),
            (Self::Int, Self::Float) | (Self::Float, Self::Int)
        )
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value computed by a node or stored as a parameter default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
    /// List of values
    List(Vec<Value>),
    /// String-keyed mapping, insertion-ordered
    Map(IndexMap<String, Value>),
}

impl Value {
    /// The most specific type tag describing this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Any,
            Self::Bool(_) => DataType::Bool,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Str(_) => DataType::Str,
            Self::List(_) => DataType::List,
            Self::Map(_) => DataType::Map,
        }
    }

    /// True if the value is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Coerce this value into the given type tag.
    ///
    /// Connected values arrive already typed, but user-entered defaults are
    /// often stored as text; stored text is parsed into the port's declared
    /// type here (`"3.5"` on a float port becomes `3.5`, `"[1, 2]"` on a
    /// list port is parsed as JSON).
    pub fn coerce(&self, target: DataType) -> Result<Value, CoercionError> {
        let mismatch = || CoercionError {
            expected: target,
            got: self.data_type(),
        };

        match target {
            DataType::Any => Ok(self.clone()),
            DataType::Bool => match self {
                Self::Bool(b) => Ok(Self::Bool(*b)),
                Self::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(Self::Bool(true)),
                    "false" | "0" => Ok(Self::Bool(false)),
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            DataType::Int => match self {
                Self::Int(i) => Ok(Self::Int(*i)),
                // Float-to-int only when exact, so defaults never silently truncate
                Self::Float(f) if f.fract() == 0.0 => Ok(Self::Int(*f as i64)),
                Self::Str(s) => s.trim().parse().map(Self::Int).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            DataType::Float => match self {
                Self::Float(f) => Ok(Self::Float(*f)),
                Self::Int(i) => Ok(Self::Float(*i as f64)),
                Self::Str(s) => s.trim().parse().map(Self::Float).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            DataType::Str => match self {
                Self::Str(s) => Ok(Self::Str(s.clone())),
                _ => Err(mismatch()),
            },
            DataType::List => match self {
                Self::List(items) => Ok(Self::List(items.clone())),
                Self::Str(s) => match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(serde_json::Value::Array(_)) => {
                        let parsed: Vec<Value> =
                            serde_json::from_str(s).map_err(|_| mismatch())?;
                        Ok(Self::List(parsed))
                    }
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
            DataType::Map => match self {
                Self::Map(entries) => Ok(Self::Map(entries.clone())),
                Self::Str(s) => match serde_json::from_str::<serde_json::Value>(s) {
                    Ok(serde_json::Value::Object(_)) => {
                        let parsed: IndexMap<String, Value> =
                            serde_json::from_str(s).map_err(|_| mismatch())?;
                        Ok(Self::Map(parsed))
                    }
                    _ => Err(mismatch()),
                },
                _ => Err(mismatch()),
            },
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A stored default could not be parsed into the port's declared type.
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot coerce {got} value to {expected}")]
pub struct CoercionError {
    /// The port's declared type
    pub expected: DataType,
    /// The type of the stored value
    pub got: DataType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults_parse_to_declared_type() {
        assert_eq!(
            Value::from("3.5").coerce(DataType::Float).unwrap(),
            Value::Float(3.5)
        );
        assert_eq!(
            Value::from("42").coerce(DataType::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            Value::from("true").coerce(DataType::Bool).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            Value::from("[1, 2, 3]").coerce(DataType::List).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );

        let coerced = Value::from(r#"{"a": 1}"#).coerce(DataType::Map).unwrap();
        let Value::Map(entries) = coerced else {
            panic!("expected map");
        };
        assert_eq!(entries.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_numeric_widening() {
        assert_eq!(
            Value::Int(5).coerce(DataType::Float).unwrap(),
            Value::Float(5.0)
        );
        assert_eq!(
            Value::Float(5.0).coerce(DataType::Int).unwrap(),
            Value::Int(5)
        );
        // Fractional floats never truncate to int
        assert!(Value::Float(5.5).coerce(DataType::Int).is_err());
    }

    #[test]
    fn test_unparseable_text_is_an_error() {
        let err = Value::from("not a number").coerce(DataType::Float).unwrap_err();
        assert_eq!(err.expected, DataType::Float);
        assert_eq!(err.got, DataType::Str);

        assert!(Value::from("{oops").coerce(DataType::Map).is_err());
        assert!(Value::from(r#"{"a": 1}"#).coerce(DataType::List).is_err());
    }

    #[test]
    fn test_any_passes_through() {
        let v = Value::List(vec![Value::Int(1)]);
        assert_eq!(v.coerce(DataType::Any).unwrap(), v);
    }

    #[test]
    fn test_connection_compatibility() {
        assert!(DataType::Int.can_connect_to(&DataType::Float));
        assert!(DataType::Any.can_connect_to(&DataType::Map));
        assert!(DataType::Str.can_connect_to(&DataType::Any));
        assert!(!DataType::Str.can_connect_to(&DataType::Int));
        assert!(!DataType::List.can_connect_to(&DataType::Map));
    }

    #[test]
    fn test_json_to_value() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"input": {"urls": ["a", "b"]}, "n": 3}"#).unwrap();
        let value = Value::from(json);
        let Value::Map(entries) = value else {
            panic!("expected map");
        };
        assert_eq!(entries.get("n"), Some(&Value::Int(3)));
    }
}
