//! AST for structural-path queries.

use serde_json::Value;

/// A parsed query: an ordered list of segments applied from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct PathQuery {
    pub segments: Vec<Segment>,
}

/// One segment: either a plain child step or a recursive-descent step
/// (`..`), holding one or more selectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub selectors: Vec<Selector>,
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// `.name` or `['name']`
    Name(String),
    /// `[3]`, `[-1]` (negative counts from the end)
    Index(isize),
    /// `[start:end:step]`
    Slice {
        start: Option<isize>,
        end: Option<isize>,
        step: Option<isize>,
    },
    /// `.*` or `[*]`
    Wildcard,
    /// `[?expr]` / `[?(expr)]`
    Filter(Filter),
}

/// Boolean filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Or(Box<Filter>, Box<Filter>),
    And(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    Cmp {
        op: CmpOp,
        lhs: Operand,
        rhs: Operand,
    },
    /// Bare operand in boolean position: existence for paths, truthiness
    /// for literals and function results.
    Truthy(Operand),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A value-producing term inside a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Value),
    /// `@...` — relative to the node under test.
    Relative(PathQuery),
    /// `$...` — relative to the document root.
    Absolute(PathQuery),
    Call {
        func: Func,
        args: Vec<Operand>,
    },
}

/// The fixed filter-function set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    /// `length(x)` — string/array/object length.
    Length,
    /// `count(path)` — number of matches.
    Count,
    /// `value(path)` — the single matched value.
    Value,
    /// `match(x, regex)` — full regex match.
    Match,
    /// `search(x, regex)` — partial regex match.
    Search,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "length" => Some(Func::Length),
            "count" => Some(Func::Count),
            "value" => Some(Func::Value),
            "match" => Some(Func::Match),
            "search" => Some(Func::Search),
            _ => None,
        }
    }
}
