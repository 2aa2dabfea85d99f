//! A small sandboxed expression language over JSON values.
//!
//! Expressions are JavaScript-flavored — member access, indexing, lambdas,
//! the usual operators, and a fixed set of array/string/object builtins —
//! but the grammar is deliberately narrow: no assignment, no statements, no
//! global or constructor access. The only reachable state is the single
//! bound document, so a caller-supplied query can read data and nothing
//! else.
//!
//! # Example
//!
//! ```
//! use json_pilot_expr::evaluate;
//! use serde_json::json;
//!
//! let doc = json!([1, 2, 3]);
//! let result = evaluate("data.filter(i => i > 1)", "data", &doc).unwrap();
//! assert_eq!(result.into_json(), Some(json!([2, 3])));
//! ```

mod error;
pub use error::ExprError;

mod lexer;

mod parser;
pub use parser::{parse_expression, BinOp, Expr, UnaryOp};

mod eval;
pub use eval::{evaluate, ExprValue};
