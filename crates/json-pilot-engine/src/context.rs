//! High-level editing context.
//!
//! [`EditorContext`] holds the current text snapshot and derived state
//! (overlay markers, last query result) and exposes the user-facing
//! operations. It pushes edits to a [`TextSurface`] and reports outcomes
//! through a [`Notifier`]; it never talks to a rendering layer directly.

use json_pilot_tree::parse;

use crate::codec::path_from_identifier;
use crate::compress::compress;
use crate::document::{
    escape_text, sort_keys, unescape_text, SortDirection, Unescaped,
};
use crate::format::FormatOptions;
use crate::overlay::{compute_overlay, OverlayMarker};
use crate::query::{run_query, QueryKind, QueryResult};
use crate::surface::{surface_edits, Notifier, TextSurface};
use crate::toggle::{apply_edits, toggle_at_path};

/// Surface action identifiers.
pub const ACTION_FORMAT: &str = "editor.action.formatDocument";
pub const ACTION_FOLD_ALL: &str = "editor.foldAll";
pub const ACTION_UNFOLD_ALL: &str = "editor.unfoldAll";

const MSG_EXPAND_ERROR: &str = "Failed to expand JSON: The string is not valid JSON.";
const MSG_COMPRESSED: &str = "JSON compressed successfully!";
const MSG_ESCAPED: &str = "Content escaped successfully!";
const MSG_UNESCAPED: &str = "Content unescaped successfully!";
const MSG_ALREADY_JSON: &str = "Content was already valid JSON. Formatted instead.";
const MSG_UNESCAPE_ERROR: &str = "Failed to unescape: Invalid escaped string.";
const MSG_NOTHING_TO_SORT: &str = "Nothing to sort.";
const MSG_SORT_ERROR: &str = "Failed to sort keys. The content might not be valid JSON.";
const MSG_NOTHING_TO_QUERY: &str = "Nothing to query.";
const MSG_QUERY_INVALID_JSON: &str = "Cannot query invalid JSON. Please fix errors first.";
const MSG_QUERY_OK: &str = "Query executed successfully.";
const MSG_FORMATTED: &str = "JSON formatted successfully!";
const MSG_FORMAT_UNAVAILABLE: &str = "Formatting action is not available.";
const MSG_FOLDED: &str = "All folded successfully!";
const MSG_FOLD_UNAVAILABLE: &str = "Fold action is not available.";
const MSG_UNFOLDED: &str = "All unfolded successfully!";
const MSG_UNFOLD_UNAVAILABLE: &str = "Unfold action is not available.";
const MSG_CLEARED: &str = "Content cleared.";

/// Text snapshot plus the state derived from it.
#[derive(Debug, Clone, Default)]
pub struct EditorContext {
    pub text: String,
    pub markers: Vec<OverlayMarker>,
    pub query_result: Option<QueryResult>,
    pub format: FormatOptions,
}

impl EditorContext {
    pub fn new(text: impl Into<String>) -> Self {
        let mut ctx = EditorContext {
            text: text.into(),
            ..EditorContext::default()
        };
        ctx.refresh_overlay();
        ctx
    }

    /// Replaces the text snapshot and recomputes markers. Called on
    /// every external edit; stale markers must never outlive the text
    /// that produced them.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.refresh_overlay();
    }

    pub fn refresh_overlay(&mut self) {
        self.markers = match parse(&self.text) {
            Some(tree) => compute_overlay(&tree),
            None => Vec::new(),
        };
    }

    /// Handles a click on a marker identifier: decodes the path, computes
    /// the toggle edit, applies it to both the surface and the snapshot.
    /// Undecodable identifiers are ignored.
    pub fn toggle_at_identifier<S: TextSurface, N: Notifier>(
        &mut self,
        identifier: &str,
        surface: &mut S,
        notifier: &N,
    ) {
        let Some(path) = path_from_identifier(identifier) else {
            return;
        };
        match toggle_at_path(&self.text, &path, &self.format) {
            Ok(edits) if edits.is_empty() => {}
            Ok(edits) => {
                surface.apply_edits(&surface_edits(&self.text, &edits));
                self.text = apply_edits(&self.text, &edits);
                self.refresh_overlay();
            }
            Err(err) => {
                tracing::debug!(%err, "toggle failed");
                notifier.error(MSG_EXPAND_ERROR);
            }
        }
    }

    pub fn execute_query<N: Notifier>(&mut self, query: &str, kind: QueryKind, notifier: &N) {
        if self.text.trim().is_empty() {
            notifier.info(MSG_NOTHING_TO_QUERY);
            return;
        }
        let Some(tree) = parse(&self.text) else {
            notifier.error(MSG_QUERY_INVALID_JSON);
            return;
        };
        let doc = tree.node_value(tree.root());
        match run_query(&doc, query, kind) {
            Ok(result) => {
                self.query_result = Some(result);
                notifier.success(MSG_QUERY_OK);
            }
            Err(err) => notifier.error(&format!("Query failed: {err}")),
        }
    }

    pub fn dismiss_query_result(&mut self) {
        self.query_result = None;
    }

    pub fn compress<N: Notifier>(&mut self, notifier: &N) {
        if self.text.is_empty() {
            return;
        }
        self.text = compress(&self.text);
        self.refresh_overlay();
        notifier.success(MSG_COMPRESSED);
    }

    pub fn sort_keys<N: Notifier>(&mut self, direction: SortDirection, notifier: &N) {
        if self.text.trim().is_empty() {
            notifier.info(MSG_NOTHING_TO_SORT);
            return;
        }
        match sort_keys(&self.text, direction, &self.format) {
            Ok(sorted) => {
                self.text = sorted;
                self.refresh_overlay();
                notifier.success(match direction {
                    SortDirection::Ascending => "Keys sorted ascending.",
                    SortDirection::Descending => "Keys sorted descending.",
                });
            }
            Err(_) => notifier.error(MSG_SORT_ERROR),
        }
    }

    pub fn escape<N: Notifier>(&mut self, notifier: &N) {
        if self.text.is_empty() {
            return;
        }
        self.text = escape_text(&self.text);
        self.refresh_overlay();
        notifier.success(MSG_ESCAPED);
    }

    pub fn unescape<N: Notifier>(&mut self, notifier: &N) {
        if self.text.is_empty() {
            return;
        }
        match unescape_text(&self.text) {
            Ok(Unescaped::Text(content)) => {
                self.text = content;
                self.refresh_overlay();
                notifier.success(MSG_UNESCAPED);
            }
            Ok(Unescaped::AlreadyJson(compact)) => {
                self.text = compact;
                self.refresh_overlay();
                notifier.info(MSG_ALREADY_JSON);
            }
            Err(_) => notifier.error(MSG_UNESCAPE_ERROR),
        }
    }

    pub fn clear<N: Notifier>(&mut self, notifier: &N) {
        self.text.clear();
        self.markers.clear();
        notifier.info(MSG_CLEARED);
    }

    pub fn format_document<S: TextSurface, N: Notifier>(&mut self, surface: &mut S, notifier: &N) {
        if surface.run_action(ACTION_FORMAT) {
            notifier.success(MSG_FORMATTED);
        } else {
            notifier.error(MSG_FORMAT_UNAVAILABLE);
        }
    }

    pub fn fold_all<S: TextSurface, N: Notifier>(&mut self, surface: &mut S, notifier: &N) {
        if surface.run_action(ACTION_FOLD_ALL) {
            notifier.success(MSG_FOLDED);
        } else {
            notifier.error(MSG_FOLD_UNAVAILABLE);
        }
    }

    pub fn unfold_all<S: TextSurface, N: Notifier>(&mut self, surface: &mut S, notifier: &N) {
        if surface.run_action(ACTION_UNFOLD_ALL) {
            notifier.success(MSG_UNFOLDED);
        } else {
            notifier.error(MSG_UNFOLD_UNAVAILABLE);
        }
    }
}
