//! Document flattening
//!
//! Turns a nested JSON document into a flat map from dotted path to scalar:
//!
//! ```text
//! {"a": 2, "b": {"c": {"d": 5}}, "e": [6, 7, 8]}
//!   -> {"a": 2, "b.c.d": 5, "e.0": 6, "e.1": 7, "e.2": 8}
//! ```
//!
//! Array elements always become indexed path segments, whatever their type.
//! Empty objects and empty arrays have no leaves and contribute no keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Separator between path segments
pub const PATH_SEPARATOR: char = '.';

/// A flat record: dotted path -> scalar, ordered by path
pub type FlatDocument = BTreeMap<String, Scalar>;

/// A leaf value of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON `null`
    Null,
    /// JSON boolean
    Bool(bool),
    /// JSON number
    Number(Number),
    /// JSON string
    String(String),
}

impl Scalar {
    /// Convert a JSON value, returning `None` for objects and arrays
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Text form used when a scalar lands in a text column; `null` is empty
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// Flatten a document whose root is a JSON object.
pub fn flatten(document: &Map<String, Value>) -> FlatDocument {
    let mut out = FlatDocument::new();
    for (key, value) in document {
        flatten_into(key.clone(), value, &mut out);
    }
    out
}

/// Flatten an arbitrary JSON value, rejecting anything but an object root.
pub fn flatten_value(document: &Value) -> Result<FlatDocument> {
    match document {
        Value::Object(map) => Ok(flatten(map)),
        other => Err(Error::NotADocument {
            kind: json_kind(other),
        }),
    }
}

fn flatten_into(path: String, value: &Value, out: &mut FlatDocument) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(child_path(&path, key), child, out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child_path(&path, &index.to_string()), child, out);
            }
        }
        Value::Null => {
            out.insert(path, Scalar::Null);
        }
        Value::Bool(b) => {
            out.insert(path, Scalar::Bool(*b));
        }
        Value::Number(n) => {
            out.insert(path, Scalar::Number(n.clone()));
        }
        Value::String(s) => {
            out.insert(path, Scalar::String(s.clone()));
        }
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    let mut path = String::with_capacity(parent.len() + segment.len() + 1);
    path.push_str(parent);
    path.push(PATH_SEPARATOR);
    path.push_str(segment);
    path
}

/// Rebuild a nested document from a flat one.
///
/// Objects whose keys are exactly `0..n` are turned back into arrays. Source
/// keys that themselves contained `.` cannot be told apart from nesting.
pub fn unflatten(flat: &FlatDocument) -> Value {
    let mut root = Map::new();
    for (path, scalar) in flat {
        let mut segments = path.split(PATH_SEPARATOR).peekable();
        let mut node = &mut root;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                node.insert(segment.to_string(), scalar.clone().into());
                break;
            }
            let entry = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(child) = entry else {
                unreachable!("entry was just made an object");
            };
            node = child;
        }
    }
    restore_arrays(Value::Object(root))
}

fn restore_arrays(value: Value) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let is_sequence = !map.is_empty()
        && (0..map.len()).all(|index| map.contains_key(index.to_string().as_str()));

    if is_sequence {
        let mut indexed: Vec<(usize, Value)> = map
            .into_iter()
            .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, restore_arrays(v))))
            .collect();
        indexed.sort_by_key(|(i, _)| *i);
        Value::Array(indexed.into_iter().map(|(_, v)| v).collect())
    } else {
        Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, restore_arrays(v)))
                .collect(),
        )
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> FlatDocument {
        flatten_value(&value).unwrap()
    }

    #[test]
    fn test_flatten_nested_objects_and_arrays() {
        let result = flat(json!({"a": 2, "b": {"c": {"d": 5}}, "e": [6, 7, 8]}));

        let expected: FlatDocument = [
            ("a", Scalar::from(2_i64)),
            ("b.c.d", Scalar::from(5_i64)),
            ("e.0", Scalar::from(6_i64)),
            ("e.1", Scalar::from(7_i64)),
            ("e.2", Scalar::from(8_i64)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_flatten_array_of_subdocuments() {
        let result = flat(json!({"items": [{"sku": "A1", "qty": 2}, {"sku": "B7", "tags": ["x"]}]}));
        assert_eq!(result["items.0.sku"], Scalar::from("A1"));
        assert_eq!(result["items.0.qty"], Scalar::from(2_i64));
        assert_eq!(result["items.1.sku"], Scalar::from("B7"));
        assert_eq!(result["items.1.tags.0"], Scalar::from("x"));
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_flatten_nested_arrays() {
        let result = flat(json!({"m": [[1, 2], [3]]}));
        assert_eq!(result["m.0.0"], Scalar::from(1_i64));
        assert_eq!(result["m.0.1"], Scalar::from(2_i64));
        assert_eq!(result["m.1.0"], Scalar::from(3_i64));
    }

    #[test]
    fn test_flatten_keeps_null_and_bool_leaves() {
        let result = flat(json!({"deleted": false, "note": null}));
        assert_eq!(result["deleted"], Scalar::Bool(false));
        assert_eq!(result["note"], Scalar::Null);
    }

    #[test]
    fn test_flatten_drops_empty_containers() {
        let result = flat(json!({"a": {}, "b": [], "c": 1}));
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("c"));
    }

    #[test]
    fn test_flatten_rejects_non_object_root() {
        let err = flatten_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::NotADocument { kind: "array" }));
    }

    #[test]
    fn test_flatten_is_deterministic() {
        let doc = json!({"z": {"y": 1}, "a": [true, "s"]});
        assert_eq!(flat(doc.clone()), flat(doc));
    }

    #[test]
    fn test_unflatten_round_trip() {
        let doc = json!({
            "a": 2,
            "b": {"c": {"d": 5}},
            "e": [6, 7, 8],
            "items": [{"sku": "A1"}, {"sku": "B7", "dims": [1.5, 2.5]}],
            "flag": null,
        });
        assert_eq!(unflatten(&flat(doc.clone())), doc);
    }

    #[test]
    fn test_unflatten_orders_long_arrays_numerically() {
        let values: Vec<i64> = (0..12).collect();
        let doc = json!({"n": values});
        assert_eq!(unflatten(&flat(doc.clone())), doc);
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::from("x").to_string(), "x");
        assert_eq!(Scalar::from(7_i64).to_string(), "7");
        assert_eq!(Scalar::Bool(true).to_string(), "true");
        assert_eq!(Scalar::Null.to_string(), "");
    }

    #[test]
    fn test_flat_document_serializes_as_object() {
        let result = flat(json!({"a": {"b": "c"}}));
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"a.b": "c"}));
    }
}
