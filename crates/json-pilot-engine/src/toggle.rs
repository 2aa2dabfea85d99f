//! Collapse/expand text edits.
//!
//! A toggle never mutates the document itself; it produces byte-ranged
//! replacement edits for the host to apply. Collapse turns a container
//! into an escaped string literal of its compact serialization; expand
//! turns such a string back into pretty-printed structure at the
//! indentation of the line it sits on. The two are inverses up to
//! whitespace and deep-equal in value.

use json_pilot_tree::{parse, NodeId, NodeKind, ParseTree, PathSegment};
use serde_json::Value;

use crate::error::EngineError;
use crate::format::{serialize_compact, serialize_indented, FormatOptions};

/// A single replacement of a byte range with new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl TextEdit {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Applies edits to a text snapshot, returning the new text.
///
/// Edits must be non-overlapping; they are applied back to front so
/// earlier offsets stay valid.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.offset);
    let mut out = text.to_owned();
    for edit in sorted.into_iter().rev() {
        out.replace_range(edit.offset..edit.end(), &edit.text);
    }
    out
}

/// Computes the edit that toggles the node at `path`.
///
/// Unresolvable paths, the root node, and scalar nodes other than
/// embedded-JSON strings are silent no-ops yielding no edits. Expanding
/// a string whose content is not a JSON object or array is an error.
pub fn toggle_at_path(
    text: &str,
    path: &[PathSegment],
    format: &FormatOptions,
) -> Result<Vec<TextEdit>, EngineError> {
    let Some(tree) = parse(text) else {
        return Ok(Vec::new());
    };
    let Some(id) = tree.find_node_at_path(path) else {
        return Ok(Vec::new());
    };
    // Only nodes sitting in a property-value or array-element slot can be
    // rewritten in place.
    let Some(parent) = tree.node(id).parent else {
        return Ok(Vec::new());
    };
    let parent_kind = tree.node(parent).kind;
    if !matches!(parent_kind, NodeKind::Property | NodeKind::Array) {
        return Ok(Vec::new());
    }

    let node = tree.node(id);
    match node.kind {
        NodeKind::String => {
            let content = node
                .scalar
                .as_ref()
                .and_then(Value::as_str)
                .ok_or(EngineError::InvalidEmbeddedJson)?;
            let parsed: Value = serde_json::from_str(content)
                .map_err(|_| EngineError::InvalidEmbeddedJson)?;
            if !matches!(parsed, Value::Object(_) | Value::Array(_)) {
                return Err(EngineError::InvalidEmbeddedJson);
            }
            let replacement = serialize_indented(&parsed, format, line_indent(text, node.offset));
            Ok(vec![TextEdit {
                offset: node.offset,
                length: node.length,
                text: replacement,
            }])
        }
        NodeKind::Object | NodeKind::Array => {
            let compact = serialize_compact(&tree.node_value(id));
            let literal = serialize_compact(&Value::String(compact));
            if parent_kind == NodeKind::Property {
                Ok(vec![collapse_property(&tree, text, parent, literal)])
            } else {
                Ok(vec![TextEdit {
                    offset: node.offset,
                    length: node.length,
                    text: literal,
                }])
            }
        }
        _ => Ok(Vec::new()),
    }
}

/// Replaces the whole `key: value` span so the key text stays verbatim,
/// odd escapes and all.
fn collapse_property(tree: &ParseTree, text: &str, property: NodeId, literal: String) -> TextEdit {
    let prop = tree.node(property);
    let key_text = match tree.children(property).first() {
        Some(&key) => {
            let key_node = tree.node(key);
            &text[key_node.offset..key_node.end()]
        }
        None => "\"\"",
    };
    TextEdit {
        offset: prop.offset,
        length: prop.length,
        text: format!("{key_text}: {literal}"),
    }
}

/// Leading whitespace of the line containing `offset`.
fn line_indent(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..];
    let indent_len = line
        .char_indices()
        .find(|&(_, c)| c != ' ' && c != '\t')
        .map_or(line.len(), |(i, _)| i);
    &line[..indent_len]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn toggle(text: &str, path: &[PathSegment]) -> Vec<TextEdit> {
        toggle_at_path(text, path, &FormatOptions::default()).unwrap()
    }

    #[test]
    fn test_collapse_object_property() {
        let text = "{\n  \"a\": {\n    \"b\": 1\n  }\n}";
        let edits = toggle(text, &["a".into()]);
        assert_eq!(edits.len(), 1);
        let after = apply_edits(text, &edits);
        assert_eq!(after, "{\n  \"a\": \"{\\\"b\\\":1}\"\n}");
    }

    #[test]
    fn test_collapse_array_element() {
        let text = "[1, [2, 3], 4]";
        let edits = toggle(text, &[1usize.into()]);
        let after = apply_edits(text, &edits);
        assert_eq!(after, "[1, \"[2,3]\", 4]");
    }

    #[test]
    fn test_expand_string_property() {
        let text = "{\n  \"a\": \"{\\\"b\\\":1}\"\n}";
        let edits = toggle(text, &["a".into()]);
        let after = apply_edits(text, &edits);
        assert_eq!(after, "{\n  \"a\": {\n    \"b\": 1\n  }\n}");
    }

    #[test]
    fn test_collapse_then_expand_is_deep_equal() {
        let text = "{\n  \"outer\": {\n    \"list\": [1, 2, {\"x\": null}]\n  }\n}";
        let path: Vec<PathSegment> = vec!["outer".into()];
        let collapsed = apply_edits(text, &toggle(text, &path));
        let expanded = apply_edits(&collapsed, &toggle(&collapsed, &path));
        let before: Value = serde_json::from_str(text).unwrap();
        let after: Value = serde_json::from_str(&expanded).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_collapse_then_expand_with_trailing_backslash_string() {
        let text = r#"{"z": {"p": "C:\\"}}"#;
        let path: Vec<PathSegment> = vec!["z".into()];
        let collapsed = apply_edits(text, &toggle(text, &path));
        let expanded = apply_edits(&collapsed, &toggle(&collapsed, &path));
        let before: Value = serde_json::from_str(text).unwrap();
        let after: Value = serde_json::from_str(&expanded).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_expand_uses_line_indent() {
        let text = "{\n    \"deep\": {\n        \"a\": \"[1]\"\n    }\n}";
        let edits = toggle(text, &["deep".into(), "a".into()]);
        let after = apply_edits(text, &edits);
        assert!(after.contains("\"a\": [\n          1\n        ]"), "{after}");
    }

    #[test]
    fn test_key_text_preserved_verbatim() {
        let text = r#"{"weird": [1]}"#;
        let edits = toggle(text, &["weird".into()]);
        let after = apply_edits(text, &edits);
        assert!(after.starts_with(r#"{"weird": "#), "{after}");
    }

    #[test]
    fn test_unresolved_path_is_noop() {
        assert!(toggle(r#"{"a": 1}"#, &["missing".into()]).is_empty());
    }

    #[test]
    fn test_root_is_noop() {
        assert!(toggle(r#"{"a": 1}"#, &[]).is_empty());
    }

    #[test]
    fn test_scalar_number_is_noop() {
        assert!(toggle(r#"{"a": 1}"#, &["a".into()]).is_empty());
    }

    #[test]
    fn test_expand_plain_string_is_error() {
        let err = toggle_at_path(
            r#"{"a": "hello"}"#,
            &["a".into()],
            &FormatOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidEmbeddedJson);
    }

    #[test]
    fn test_expand_scalar_json_string_is_error() {
        let err = toggle_at_path(r#"{"a": "42"}"#, &["a".into()], &FormatOptions::default())
            .unwrap_err();
        assert_eq!(err, EngineError::InvalidEmbeddedJson);
    }

    #[test]
    fn test_unparseable_document_is_noop() {
        assert!(toggle("???", &["a".into()]).is_empty());
    }

    #[test]
    fn test_collapse_preserves_key_order() {
        let text = r#"{"z": {"b": 1, "a": 2}}"#;
        let after = apply_edits(text, &toggle(text, &["z".into()]));
        assert!(after.contains(r#""{\"b\":1,\"a\":2}""#), "{after}");
    }

    #[test]
    fn test_expand_result_matches_embedded_value() {
        let text = r#"{"p": "{\"k\": [true, null]}"}"#;
        let after = apply_edits(text, &toggle(text, &["p".into()]));
        let value: Value = serde_json::from_str(&after).unwrap();
        assert_eq!(value["p"], json!({"k": [true, null]}));
    }
}
