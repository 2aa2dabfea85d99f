//! Structural paths: key/index sequences locating a node from the root.

use serde_json::Value;
use std::fmt;

/// One step of a structural path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property key.
    Key(String),
    /// Array element index.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{:?}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Canonical JSON-array form of a path: keys as strings, indices as numbers.
/// This is the form the path codec serializes.
pub fn path_to_json(path: &[PathSegment]) -> Value {
    Value::Array(
        path.iter()
            .map(|seg| match seg {
                PathSegment::Key(k) => Value::String(k.clone()),
                PathSegment::Index(i) => Value::Number((*i).into()),
            })
            .collect(),
    )
}

/// Inverse of [`path_to_json`]. Returns `None` if the value is not an array
/// of strings and non-negative integers.
pub fn path_from_json(value: &Value) -> Option<Vec<PathSegment>> {
    let arr = value.as_array()?;
    let mut path = Vec::with_capacity(arr.len());
    for item in arr {
        match item {
            Value::String(s) => path.push(PathSegment::Key(s.clone())),
            Value::Number(n) => path.push(PathSegment::Index(n.as_u64()? as usize)),
            _ => return None,
        }
    }
    Some(path)
}
