//! Overlay marker computation.
//!
//! Walks a parse tree in document order and emits one marker per node
//! that supports a toggle affordance. Markers are pure data anchored to
//! byte offsets; they carry the node's path as an opaque token so a
//! later click can be resolved without keeping the tree alive.

use json_pilot_tree::{NodeId, NodeKind, ParseTree};
use serde_json::Value;

use crate::codec::{encode_path, MARKER_PATH_PREFIX};

/// What a marker's toggle would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// An object or array that can be collapsed into a string literal.
    Collapsible,
    /// A string whose content is itself a JSON object or array.
    Expandable,
}

/// A decoration anchor for one toggleable node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayMarker {
    /// Byte offset of the node's first character.
    pub anchor_offset: usize,
    pub kind: MarkerKind,
    /// Encoded structural path of the node.
    pub token: String,
}

impl OverlayMarker {
    /// Full identifier string for embedding in a rendering layer.
    pub fn identifier(&self) -> String {
        format!("{MARKER_PATH_PREFIX}{}", self.token)
    }
}

/// Computes the full marker set for a parse tree, in document order.
///
/// Every object and array gets a collapsible marker, the root included.
/// A string in value position gets an expandable marker when its content
/// parses to an object or array; property-name strings never do.
pub fn compute_overlay(tree: &ParseTree) -> Vec<OverlayMarker> {
    let mut markers = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        visit(tree, id, &mut markers);
        for &child in tree.children(id).iter().rev() {
            stack.push(child);
        }
    }
    markers
}

fn visit(tree: &ParseTree, id: NodeId, markers: &mut Vec<OverlayMarker>) {
    let node = tree.node(id);
    match node.kind {
        NodeKind::Object | NodeKind::Array => {
            markers.push(OverlayMarker {
                anchor_offset: node.offset,
                kind: MarkerKind::Collapsible,
                token: encode_path(&tree.path_of(id)),
            });
        }
        NodeKind::String => {
            if tree.is_property_name(id) || !in_value_position(tree, id) {
                return;
            }
            let Some(content) = node.scalar.as_ref().and_then(Value::as_str) else {
                return;
            };
            if embeds_container(content) {
                markers.push(OverlayMarker {
                    anchor_offset: node.offset,
                    kind: MarkerKind::Expandable,
                    token: encode_path(&tree.path_of(id)),
                });
            }
        }
        _ => {}
    }
}

fn in_value_position(tree: &ParseTree, id: NodeId) -> bool {
    match tree.node(id).parent {
        Some(parent) => matches!(
            tree.node(parent).kind,
            NodeKind::Property | NodeKind::Array
        ),
        None => false,
    }
}

fn embeds_container(content: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(content),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_path;
    use json_pilot_tree::{parse, PathSegment};

    fn markers_of(text: &str) -> Vec<OverlayMarker> {
        compute_overlay(&parse(text).unwrap())
    }

    fn paths(markers: &[OverlayMarker]) -> Vec<Vec<PathSegment>> {
        markers
            .iter()
            .map(|m| decode_path(&m.token).unwrap())
            .collect()
    }

    #[test]
    fn test_root_object_is_collapsible() {
        let markers = markers_of(r#"{"a": 1}"#);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Collapsible);
        assert_eq!(markers[0].anchor_offset, 0);
        assert_eq!(decode_path(&markers[0].token).unwrap(), vec![]);
    }

    #[test]
    fn test_nested_containers_all_marked() {
        let markers = markers_of(r#"{"a": {"b": [1, {"c": 2}]}}"#);
        let collapsible: Vec<_> = markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Collapsible)
            .collect();
        assert_eq!(collapsible.len(), 4);
        assert_eq!(
            paths(&markers),
            vec![
                vec![],
                vec![PathSegment::Key("a".into())],
                vec![PathSegment::Key("a".into()), PathSegment::Key("b".into())],
                vec![
                    PathSegment::Key("a".into()),
                    PathSegment::Key("b".into()),
                    PathSegment::Index(1)
                ],
            ]
        );
    }

    #[test]
    fn test_markers_in_document_order() {
        let markers = markers_of(r#"[{"a": 1}, [2], {"b": 3}]"#);
        let offsets: Vec<_> = markers.iter().map(|m| m.anchor_offset).collect();
        let mut sorted = offsets.clone();
        sorted.sort_unstable();
        assert_eq!(offsets, sorted);
    }

    #[test]
    fn test_embedded_json_string_is_expandable() {
        let markers = markers_of(r#"{"payload": "{\"x\": 1}"}"#);
        let expandable: Vec<_> = markers
            .iter()
            .filter(|m| m.kind == MarkerKind::Expandable)
            .collect();
        assert_eq!(expandable.len(), 1);
        assert_eq!(
            decode_path(&expandable[0].token).unwrap(),
            vec![PathSegment::Key("payload".into())]
        );
    }

    #[test]
    fn test_embedded_array_string_in_array_is_expandable() {
        let markers = markers_of(r#"["[1, 2]"]"#);
        assert!(markers
            .iter()
            .any(|m| m.kind == MarkerKind::Expandable && m.anchor_offset == 1));
    }

    #[test]
    fn test_plain_string_not_expandable() {
        let markers = markers_of(r#"{"a": "hello", "b": "42", "c": "true"}"#);
        assert!(markers.iter().all(|m| m.kind == MarkerKind::Collapsible));
    }

    #[test]
    fn test_property_name_never_expandable() {
        let markers = markers_of(r#"{"{\"x\": 1}": "plain"}"#);
        assert!(markers.iter().all(|m| m.kind == MarkerKind::Collapsible));
    }

    #[test]
    fn test_scalar_root_yields_no_markers() {
        assert!(markers_of("42").is_empty());
        assert!(markers_of(r#""{\"a\": 1}""#).is_empty());
    }

    #[test]
    fn test_identifier_carries_prefix() {
        let markers = markers_of("{}");
        assert!(markers[0].identifier().starts_with("json-path-"));
    }
}
