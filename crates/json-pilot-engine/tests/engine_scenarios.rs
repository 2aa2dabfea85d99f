//! End-to-end flows through the engine: overlay, toggle, query,
//! compression and the editing context.

use json_pilot_engine::{
    apply_edits, compress, compute_overlay, decode_path, path_from_identifier, run_query,
    toggle_at_path, EditorContext, FormatOptions, MarkerKind, Notifier, QueryKind, QueryResult,
    SurfaceEdit, TextSurface,
};
use json_pilot_tree::{parse, PathSegment};
use serde_json::{json, Value};
use std::cell::RefCell;

fn markers(text: &str) -> Vec<json_pilot_engine::OverlayMarker> {
    compute_overlay(&parse(text).unwrap())
}

#[test]
fn test_flat_document_markers() {
    let text = r#"{"a": 1, "b": [1,2]}"#;
    let found = markers(text);
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|m| m.kind == MarkerKind::Collapsible));
    assert_eq!(found[0].anchor_offset, 0);
    assert_eq!(found[1].anchor_offset, text.find('[').unwrap());
}

#[test]
fn test_expand_embedded_payload_then_recompute() {
    let text = r#"{"payload": "{\"x\":1}"}"#;
    let before = markers(text);
    assert_eq!(before.len(), 2);
    assert_eq!(before[0].kind, MarkerKind::Collapsible);
    assert_eq!(before[1].kind, MarkerKind::Expandable);

    let path = decode_path(&before[1].token).unwrap();
    assert_eq!(path, vec![PathSegment::Key("payload".into())]);

    let edits = toggle_at_path(text, &path, &FormatOptions::default()).unwrap();
    let after_text = apply_edits(text, &edits);
    let value: Value = serde_json::from_str(&after_text).unwrap();
    assert_eq!(value, json!({"payload": {"x": 1}}));

    let after = markers(&after_text);
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|m| m.kind == MarkerKind::Collapsible));
    assert_eq!(decode_path(&after[1].token).unwrap(), path);
}

#[test]
fn test_marker_completeness() {
    // 3 containers, 2 embedded-JSON strings, 1 embedded-JSON property name.
    let text = r#"{
      "a": {"inner": "[1]"},
      "b": [1, "{\"k\":2}"],
      "{\"not\":1}": 3
    }"#;
    let found = markers(text);
    let collapsible = found
        .iter()
        .filter(|m| m.kind == MarkerKind::Collapsible)
        .count();
    let expandable = found
        .iter()
        .filter(|m| m.kind == MarkerKind::Expandable)
        .count();
    assert_eq!(collapsible, 3);
    assert_eq!(expandable, 2);
}

#[test]
fn test_collapse_expand_inverse_preserves_value() {
    let text = "{\n  \"cfg\": {\n    \"flags\": [true, false],\n    \"name\": \"x\"\n  }\n}";
    let path: Vec<PathSegment> = vec!["cfg".into()];
    let opts = FormatOptions::default();

    let collapsed = apply_edits(text, &toggle_at_path(text, &path, &opts).unwrap());
    let reexpanded = apply_edits(&collapsed, &toggle_at_path(&collapsed, &path, &opts).unwrap());

    let original: Value = serde_json::from_str(text).unwrap();
    let round_tripped: Value = serde_json::from_str(&reexpanded).unwrap();
    assert_eq!(original, round_tripped);
}

#[test]
fn test_path_query_wildcard_many() {
    let doc = json!({"b": [1, 2]});
    let result = run_query(&doc, "$.b[*]", QueryKind::StructuralPath).unwrap();
    assert_eq!(result, QueryResult::Many(vec![json!(1), json!(2)]));
}

#[test]
fn test_path_query_missing_none() {
    let doc = json!({"b": 1});
    let result = run_query(&doc, "$.missing", QueryKind::StructuralPath).unwrap();
    assert_eq!(result, QueryResult::None);
}

#[test]
fn test_expression_filter_shorthand() {
    let doc = json!([1, 2, 3]);
    let result = run_query(&doc, ".filter(i => i > 1)", QueryKind::Expression).unwrap();
    assert_eq!(result, QueryResult::Single(json!([2, 3])));
}

#[test]
fn test_compression_preserves_value() {
    let text = "{\n  \"a\": 1 // comment\n}";
    let compressed = compress(text);
    assert_eq!(compressed, "{\"a\":1}");
    assert_eq!(compress(&compressed), compressed);
    let tree = parse(text).unwrap();
    let compressed_tree = parse(&compressed).unwrap();
    assert_eq!(
        tree.node_value(tree.root()),
        compressed_tree.node_value(compressed_tree.root())
    );
}

// Host doubles for driving the editing context.

#[derive(Default)]
struct RecordingSurface {
    edits: Vec<Vec<SurfaceEdit>>,
    available_actions: Vec<&'static str>,
    ran: Vec<String>,
}

impl TextSurface for RecordingSurface {
    fn apply_edits(&mut self, edits: &[SurfaceEdit]) {
        self.edits.push(edits.to_vec());
    }

    fn run_action(&mut self, action: &str) -> bool {
        self.ran.push(action.to_owned());
        self.available_actions.contains(&action)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: RefCell<Vec<(String, String)>>,
}

impl RecordingNotifier {
    fn last(&self) -> Option<(String, String)> {
        self.messages.borrow().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.messages
            .borrow_mut()
            .push(("success".into(), message.into()));
    }

    fn error(&self, message: &str) {
        self.messages
            .borrow_mut()
            .push(("error".into(), message.into()));
    }

    fn info(&self, message: &str) {
        self.messages
            .borrow_mut()
            .push(("info".into(), message.into()));
    }
}

#[test]
fn test_context_toggle_via_identifier() {
    let mut ctx = EditorContext::new(r#"{"a": {"b": 1}}"#);
    let mut surface = RecordingSurface::default();
    let notifier = RecordingNotifier::default();

    let identifier = ctx
        .markers
        .iter()
        .find(|m| {
            path_from_identifier(&m.identifier())
                == Some(vec![PathSegment::Key("a".into())])
        })
        .map(|m| m.identifier())
        .unwrap();
    ctx.toggle_at_identifier(&identifier, &mut surface, &notifier);

    assert_eq!(ctx.text, r#"{"a": "{\"b\":1}"}"#);
    assert_eq!(surface.edits.len(), 1);
    assert_eq!(ctx.markers.len(), 2);
    assert_eq!(ctx.markers[1].kind, MarkerKind::Expandable);
    assert!(notifier.last().is_none());
}

#[test]
fn test_context_ignores_stale_identifier() {
    let mut ctx = EditorContext::new(r#"{"a": 1}"#);
    let mut surface = RecordingSurface::default();
    let notifier = RecordingNotifier::default();

    ctx.toggle_at_identifier("json-path-@@@", &mut surface, &notifier);
    assert!(surface.edits.is_empty());
    assert!(notifier.last().is_none());
}

#[test]
fn test_context_expand_error_notified() {
    let mut ctx = EditorContext::new(r#"{"a": "plain text"}"#);
    let mut surface = RecordingSurface::default();
    let notifier = RecordingNotifier::default();

    let identifier =
        json_pilot_engine::path_identifier(&[PathSegment::Key("a".into())]);
    ctx.toggle_at_identifier(&identifier, &mut surface, &notifier);
    assert_eq!(
        notifier.last().unwrap(),
        (
            "error".into(),
            "Failed to expand JSON: The string is not valid JSON.".into()
        )
    );
    assert!(surface.edits.is_empty());
}

#[test]
fn test_context_query_flow() {
    let mut ctx = EditorContext::new(r#"{"b": [1, 2]}"#);
    let notifier = RecordingNotifier::default();

    ctx.execute_query("$.b[*]", QueryKind::StructuralPath, &notifier);
    assert_eq!(
        ctx.query_result,
        Some(QueryResult::Many(vec![json!(1), json!(2)]))
    );
    assert_eq!(
        notifier.last().unwrap(),
        ("success".into(), "Query executed successfully.".into())
    );

    ctx.dismiss_query_result();
    assert_eq!(ctx.query_result, None);
}

#[test]
fn test_context_query_failure_keeps_previous_result() {
    let mut ctx = EditorContext::new(r#"{"b": 1}"#);
    let notifier = RecordingNotifier::default();

    ctx.execute_query("$.b", QueryKind::StructuralPath, &notifier);
    ctx.execute_query("$[", QueryKind::StructuralPath, &notifier);

    assert_eq!(ctx.query_result, Some(QueryResult::Single(json!(1))));
    let (level, message) = notifier.last().unwrap();
    assert_eq!(level, "error");
    assert!(message.starts_with("Query failed: "), "{message}");
}

#[test]
fn test_context_query_on_empty_document() {
    let mut ctx = EditorContext::new("   ");
    let notifier = RecordingNotifier::default();
    ctx.execute_query("$.a", QueryKind::StructuralPath, &notifier);
    assert_eq!(
        notifier.last().unwrap(),
        ("info".into(), "Nothing to query.".into())
    );
}

#[test]
fn test_context_compress_and_sort() {
    let mut ctx = EditorContext::new("{\n  \"b\": 2,\n  \"a\": 1\n}");
    let notifier = RecordingNotifier::default();

    ctx.compress(&notifier);
    assert_eq!(ctx.text, "{\"b\":2,\"a\":1}");

    ctx.sort_keys(json_pilot_engine::SortDirection::Ascending, &notifier);
    assert_eq!(ctx.text, "{\n  \"a\": 1,\n  \"b\": 2\n}");
    assert_eq!(
        notifier.last().unwrap(),
        ("success".into(), "Keys sorted ascending.".into())
    );
}

#[test]
fn test_context_escape_unescape_round_trip() {
    let original = r#"{"a": 1}"#;
    let mut ctx = EditorContext::new(original);
    let notifier = RecordingNotifier::default();

    ctx.escape(&notifier);
    assert_eq!(ctx.text, r#""{\"a\": 1}""#);
    assert!(ctx.markers.is_empty());

    ctx.unescape(&notifier);
    assert_eq!(ctx.text, original);
    assert_eq!(ctx.markers.len(), 1);
}

#[test]
fn test_context_surface_actions() {
    let mut ctx = EditorContext::new("{}");
    let notifier = RecordingNotifier::default();

    let mut surface = RecordingSurface {
        available_actions: vec!["editor.foldAll"],
        ..RecordingSurface::default()
    };
    ctx.fold_all(&mut surface, &notifier);
    assert_eq!(
        notifier.last().unwrap(),
        ("success".into(), "All folded successfully!".into())
    );

    ctx.format_document(&mut surface, &notifier);
    assert_eq!(
        notifier.last().unwrap(),
        ("error".into(), "Formatting action is not available.".into())
    );
    assert_eq!(surface.ran, vec!["editor.foldAll", "editor.action.formatDocument"]);
}
