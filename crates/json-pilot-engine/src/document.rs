//! Whole-document transforms.

use json_pilot_tree::parse;
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::format::{serialize_compact, serialize_indented, FormatOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Recursively sorts every object's keys and reformats the document.
///
/// Comments and original whitespace are not preserved; the result is a
/// clean re-serialization. Array order is untouched.
pub fn sort_keys(
    text: &str,
    direction: SortDirection,
    format: &FormatOptions,
) -> Result<String, EngineError> {
    let tree = parse(text).ok_or(EngineError::ParseFailure)?;
    let sorted = sort_value(tree.node_value(tree.root()), direction);
    Ok(serialize_indented(&sorted, format, ""))
}

fn sort_value(value: Value, direction: SortDirection) -> Value {
    match value {
        Value::Object(members) => {
            let mut entries: Vec<(String, Value)> = members
                .into_iter()
                .map(|(k, v)| (k, sort_value(v, direction)))
                .collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            if direction == SortDirection::Descending {
                entries.reverse();
            }
            Value::Object(Map::from_iter(entries))
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| sort_value(item, direction))
                .collect(),
        ),
        scalar => scalar,
    }
}

/// Pretty-prints the whole document. Comments are dropped.
pub fn format_text(text: &str, format: &FormatOptions) -> Result<String, EngineError> {
    let tree = parse(text).ok_or(EngineError::ParseFailure)?;
    Ok(serialize_indented(&tree.node_value(tree.root()), format, ""))
}

/// Wraps the entire text in a JSON string literal.
pub fn escape_text(text: &str) -> String {
    serialize_compact(&Value::String(text.to_owned()))
}

/// Outcome of an unescape request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unescaped {
    /// The document was a string literal; this is its content.
    Text(String),
    /// The document already parses as non-string JSON; this is its
    /// compact re-serialization.
    AlreadyJson(String),
}

/// Unwraps a document that consists of a single JSON string literal.
pub fn unescape_text(text: &str) -> Result<Unescaped, EngineError> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::String(content)) => Ok(Unescaped::Text(content)),
        Ok(other) => Ok(Unescaped::AlreadyJson(serialize_compact(&other))),
        Err(_) => Err(EngineError::ParseFailure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> FormatOptions {
        FormatOptions::default()
    }

    #[test]
    fn test_sort_ascending() {
        let out = sort_keys(r#"{"b": 1, "a": 2}"#, SortDirection::Ascending, &opts()).unwrap();
        assert_eq!(out, "{\n  \"a\": 2,\n  \"b\": 1\n}");
    }

    #[test]
    fn test_sort_descending() {
        let out = sort_keys(r#"{"a": 1, "b": 2}"#, SortDirection::Descending, &opts()).unwrap();
        assert_eq!(out, "{\n  \"b\": 2,\n  \"a\": 1\n}");
    }

    #[test]
    fn test_sort_recurses_into_nested_values() {
        let out = sort_keys(
            r#"{"z": {"y": 1, "x": 2}, "a": [{"c": 1, "b": 2}]}"#,
            SortDirection::Ascending,
            &opts(),
        )
        .unwrap();
        let a = out.find("\"a\"").unwrap();
        let z = out.find("\"z\"").unwrap();
        assert!(a < z);
        let x = out.find("\"x\"").unwrap();
        let y = out.find("\"y\"").unwrap();
        assert!(x < y);
        let b = out.find("\"b\"").unwrap();
        let c = out.find("\"c\"").unwrap();
        assert!(b < c);
    }

    #[test]
    fn test_sort_drops_comments() {
        let out = sort_keys(
            "{\n  // comment\n  \"b\": 1,\n  \"a\": 2\n}",
            SortDirection::Ascending,
            &opts(),
        )
        .unwrap();
        assert!(!out.contains("//"));
    }

    #[test]
    fn test_sort_unparseable_fails() {
        assert_eq!(
            sort_keys("???", SortDirection::Ascending, &opts()),
            Err(EngineError::ParseFailure)
        );
    }

    #[test]
    fn test_format_text() {
        let out = format_text("{\"a\":[1,2]}", &opts()).unwrap();
        assert_eq!(out, "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
    }

    #[test]
    fn test_escape_round_trip() {
        let text = "{\"a\": \"x\"}";
        let escaped = escape_text(text);
        assert_eq!(escaped, r#""{\"a\": \"x\"}""#);
        assert_eq!(unescape_text(&escaped).unwrap(), Unescaped::Text(text.into()));
    }

    #[test]
    fn test_unescape_non_string_json() {
        assert_eq!(
            unescape_text("{\"a\": 1}").unwrap(),
            Unescaped::AlreadyJson("{\"a\":1}".into())
        );
    }

    #[test]
    fn test_unescape_invalid_input() {
        assert_eq!(unescape_text("not json"), Err(EngineError::ParseFailure));
    }
}
