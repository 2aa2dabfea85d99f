//! Query execution over a document value.
//!
//! Two query flavors share one entry point: structural-path queries run
//! through the path evaluator, free-form expressions through the
//! sandboxed expression evaluator with the document bound to a fixed
//! identifier. Results are normalized by arity so hosts can render a
//! miss, a single value and a list with different affordances.

use json_pilot_expr::evaluate;
use json_pilot_path::{eval as eval_path, parse_query};
use serde_json::Value;

use crate::error::EngineError;

/// Identifier the document is bound to inside expression queries.
pub const DOC_BINDING: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// Root-anchored structural path (`$.store.book[0].title`).
    StructuralPath,
    /// Sandboxed expression over the bound document.
    Expression,
}

/// Arity-normalized query outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The query matched nothing.
    None,
    /// Exactly one value.
    Single(Value),
    /// Two or more matches, in document order.
    Many(Vec<Value>),
}

/// Runs `query` against `doc`.
pub fn run_query(doc: &Value, query: &str, kind: QueryKind) -> Result<QueryResult, EngineError> {
    match kind {
        QueryKind::StructuralPath => {
            let parsed = parse_query(query).map_err(|e| EngineError::Query(e.to_string()))?;
            let mut matches: Vec<Value> = eval_path(&parsed, doc).into_iter().cloned().collect();
            Ok(match matches.len() {
                0 => QueryResult::None,
                1 => QueryResult::Single(matches.remove(0)),
                _ => QueryResult::Many(matches),
            })
        }
        QueryKind::Expression => {
            let source = prepare_expression(query);
            let value = evaluate(&source, DOC_BINDING, doc)
                .map_err(|e| EngineError::Query(e.to_string()))?;
            Ok(match value.into_json() {
                Some(json) => QueryResult::Single(json),
                None => QueryResult::None,
            })
        }
    }
}

/// Rewrites an expression fragment into a complete evaluable expression.
///
/// A fragment opening with member or index access is prefixed with the
/// document binding; a fragment that is itself a function value is
/// invoked with the document as its sole argument.
fn prepare_expression(query: &str) -> String {
    let trimmed = query.trim();
    if trimmed.starts_with('.') || trimmed.starts_with('[') {
        return format!("{DOC_BINDING}{trimmed}");
    }
    if is_function_like(trimmed) {
        return format!("({trimmed})({DOC_BINDING})");
    }
    trimmed.to_owned()
}

/// Whether the fragment reads as a function value rather than an
/// expression to evaluate directly: a top-level arrow function or a
/// fully parenthesized callable.
fn is_function_like(fragment: &str) -> bool {
    if fragment.starts_with('(') {
        if fragment.ends_with(')') {
            return true;
        }
        // `(a, b) => ...` with a parenthesized parameter list.
        return fragment
            .find(')')
            .map_or(false, |close| fragment[close + 1..].trim_start().starts_with("=>"));
    }
    // `x => ...` with a bare parameter.
    let mut rest = fragment;
    let ident_len = rest
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .map_or(rest.len(), |(i, _)| i);
    if ident_len == 0 {
        return false;
    }
    rest = rest[ident_len..].trim_start();
    rest.starts_with("=>")
}

/// Renders a result for display with a fixed two-space indent.
pub fn render_result(result: &QueryResult) -> String {
    match result {
        QueryResult::None => "undefined".to_owned(),
        QueryResult::Single(value) => pretty(value),
        QueryResult::Many(values) => pretty(&Value::Array(values.clone())),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
