//! Tolerant structural parsing for JSON documents.
//!
//! This crate is the structural half of json-pilot: a permissive tokenizer,
//! a position-accurate parse tree with path/offset lookups, structural path
//! segments, and offset ↔ line/column conversion. A tree is valid only for
//! the exact text snapshot it was parsed from and must be rebuilt after any
//! edit.
//!
//! # Example
//!
//! ```
//! use json_pilot_tree::{parse, PathSegment};
//!
//! let tree = parse(r#"{"a": [1, 2]}"#).unwrap();
//! let node = tree.find_node_at_path(&["a".into(), 1usize.into()]).unwrap();
//! assert_eq!(tree.node(node).scalar, Some(serde_json::json!(2)));
//! assert_eq!(tree.path_of(node), vec![PathSegment::Key("a".into()), PathSegment::Index(1)]);
//! ```

mod scanner;
pub use scanner::{tokenize, Scanner, Token, TokenKind};

mod tree;
pub use tree::{parse, unescape_string_token, NodeId, NodeKind, ParseNode, ParseTree};

mod path;
pub use path::{path_from_json, path_to_json, PathSegment};

mod line_index;
pub use line_index::{LineIndex, Position};
