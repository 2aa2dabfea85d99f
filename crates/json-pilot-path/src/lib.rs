//! Structural-path queries over JSON values.
//!
//! A query is a `$`-rooted path with name, index, slice, wildcard,
//! recursive-descent and filter selectors, in the familiar JSONPath-style
//! grammar. Filters support comparison and logical operators plus the fixed
//! function set `length`/`count`/`value`/`match`/`search`.
//!
//! # Example
//!
//! ```
//! use json_pilot_path::{eval, parse_query};
//! use serde_json::json;
//!
//! let doc = json!({"b": [1, 2]});
//! let query = parse_query("$.b[*]").unwrap();
//! let matches = eval(&query, &doc);
//! assert_eq!(matches, vec![&json!(1), &json!(2)]);
//! ```

mod types;
pub use types::{CmpOp, Filter, Func, Operand, PathQuery, Segment, Selector};

mod parser;
pub use parser::{parse_query, QueryParseError};

mod eval;
pub use eval::eval;
