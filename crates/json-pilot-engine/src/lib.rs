//! Structural JSON overlay and query engine.
//!
//! Builds on the tolerant parse tree from `json_pilot_tree` to provide
//! the editor-facing operations: overlay markers with reversible path
//! tokens, collapse/expand text edits, structural-path and expression
//! queries, trivia compression and whole-document transforms. The engine
//! is surface-agnostic; hosts implement [`TextSurface`] and [`Notifier`]
//! to wire it to a concrete editor.
//!
//! # Example
//!
//! ```
//! use json_pilot_engine::{compute_overlay, path_from_identifier, MarkerKind};
//! use json_pilot_tree::parse;
//!
//! let text = r#"{"payload": "{\"x\": 1}"}"#;
//! let markers = compute_overlay(&parse(text).unwrap());
//! assert_eq!(markers[1].kind, MarkerKind::Expandable);
//! let path = path_from_identifier(&markers[1].identifier()).unwrap();
//! assert_eq!(path, vec!["payload".into()]);
//! ```

mod error;
pub use error::{DecodeFailure, EngineError};

mod codec;
pub use codec::{
    decode_path, encode_path, path_from_identifier, path_identifier, tooltip_from_identifier,
    tooltip_identifier, MARKER_PATH_PREFIX, MARKER_TOOLTIP_PREFIX,
};

mod format;
pub use format::{serialize_compact, serialize_indented, FormatOptions};

mod overlay;
pub use overlay::{compute_overlay, MarkerKind, OverlayMarker};

mod toggle;
pub use toggle::{apply_edits, toggle_at_path, TextEdit};

mod query;
pub use query::{render_result, run_query, QueryKind, QueryResult, DOC_BINDING};

mod compress;
pub use compress::compress;

mod document;
pub use document::{escape_text, format_text, sort_keys, unescape_text, SortDirection, Unescaped};

mod surface;
pub use surface::{surface_edits, Notifier, SurfaceEdit, TextSurface};

mod context;
pub use context::{
    EditorContext, ACTION_FOLD_ALL, ACTION_FORMAT, ACTION_UNFOLD_ALL,
};
