//! Structural-path query evaluator.

use crate::types::*;
use serde_json::Value;

/// Evaluate a parsed query against a document. Matches are returned in
/// document order (object member order is preserved by the parser's
/// `preserve_order` value type).
pub fn eval<'a>(query: &PathQuery, doc: &'a Value) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in &query.segments {
        let mut next = Vec::new();
        for value in current {
            if segment.recursive {
                eval_recursive(value, doc, &segment.selectors, &mut next);
            } else {
                for selector in &segment.selectors {
                    eval_selector(value, doc, selector, &mut next);
                }
            }
        }
        current = next;
    }
    current
}

fn eval_recursive<'a>(
    value: &'a Value,
    root: &'a Value,
    selectors: &[Selector],
    out: &mut Vec<&'a Value>,
) {
    for selector in selectors {
        eval_selector(value, root, selector, out);
    }
    match value {
        Value::Object(map) => {
            for child in map.values() {
                eval_recursive(child, root, selectors, out);
            }
        }
        Value::Array(arr) => {
            for child in arr {
                eval_recursive(child, root, selectors, out);
            }
        }
        _ => {}
    }
}

fn eval_selector<'a>(
    value: &'a Value,
    root: &'a Value,
    selector: &Selector,
    out: &mut Vec<&'a Value>,
) {
    match selector {
        Selector::Name(name) => {
            if let Value::Object(map) = value {
                if let Some(child) = map.get(name) {
                    out.push(child);
                }
            }
        }
        Selector::Index(index) => {
            if let Value::Array(arr) = value {
                if let Some(idx) = resolve_index(*index, arr.len()) {
                    if let Some(child) = arr.get(idx) {
                        out.push(child);
                    }
                }
            }
        }
        Selector::Slice { start, end, step } => {
            if let Value::Array(arr) = value {
                for idx in slice_indices(*start, *end, *step, arr.len()) {
                    out.push(&arr[idx]);
                }
            }
        }
        Selector::Wildcard => match value {
            Value::Object(map) => out.extend(map.values()),
            Value::Array(arr) => out.extend(arr.iter()),
            _ => {}
        },
        Selector::Filter(filter) => match value {
            Value::Array(arr) => {
                out.extend(arr.iter().filter(|child| filter_matches(filter, child, root)));
            }
            Value::Object(map) => {
                // Filters apply to member values, and to the object itself
                // when no member matched (a lone root-level object filter).
                let before = out.len();
                out.extend(map.values().filter(|child| filter_matches(filter, child, root)));
                if out.len() == before && filter_matches(filter, value, root) {
                    out.push(value);
                }
            }
            _ => {}
        },
    }
}

fn resolve_index(index: isize, len: usize) -> Option<usize> {
    if index < 0 {
        let from_end = index.unsigned_abs();
        len.checked_sub(from_end)
    } else {
        Some(index as usize)
    }
}

/// Normalized slice bounds per the usual Python-style semantics; a zero
/// step selects nothing.
fn slice_indices(
    start: Option<isize>,
    end: Option<isize>,
    step: Option<isize>,
    len: usize,
) -> Vec<usize> {
    let step = step.unwrap_or(1);
    if step == 0 || len == 0 {
        return Vec::new();
    }
    let len = len as isize;
    let clamp = |v: isize, lo: isize, hi: isize| v.max(lo).min(hi);
    let normalize = |v: isize| if v < 0 { v + len } else { v };

    let mut out = Vec::new();
    if step > 0 {
        let start = clamp(normalize(start.unwrap_or(0)), 0, len);
        let end = clamp(normalize(end.unwrap_or(len)), 0, len);
        let mut i = start;
        while i < end {
            out.push(i as usize);
            i += step;
        }
    } else {
        let start = clamp(normalize(start.unwrap_or(len - 1)), -1, len - 1);
        let end = clamp(normalize(end.unwrap_or(-len - 1)), -1, len - 1);
        let mut i = start;
        while i > end {
            out.push(i as usize);
            i += step;
        }
    }
    out
}

fn filter_matches(filter: &Filter, current: &Value, root: &Value) -> bool {
    match filter {
        Filter::Or(a, b) => filter_matches(a, current, root) || filter_matches(b, current, root),
        Filter::And(a, b) => filter_matches(a, current, root) && filter_matches(b, current, root),
        Filter::Not(inner) => !filter_matches(inner, current, root),
        Filter::Cmp { op, lhs, rhs } => {
            compare(*op, eval_operand(lhs, current, root), eval_operand(rhs, current, root))
        }
        // A bare path is an existence test; anything else tests truthiness.
        Filter::Truthy(Operand::Relative(query)) => !eval(query, current).is_empty(),
        Filter::Truthy(Operand::Absolute(query)) => !eval(query, root).is_empty(),
        Filter::Truthy(operand) => {
            eval_operand(operand, current, root).is_some_and(|v| is_truthy(&v))
        }
    }
}

/// Evaluate an operand to at most one value. Paths yield their first match;
/// `None` means "nothing" and only compares equal to itself.
fn eval_operand(operand: &Operand, current: &Value, root: &Value) -> Option<Value> {
    match operand {
        Operand::Literal(value) => Some(value.clone()),
        Operand::Relative(query) => eval(query, current).first().map(|v| (*v).clone()),
        Operand::Absolute(query) => eval(query, root).first().map(|v| (*v).clone()),
        Operand::Call { func, args } => eval_function(*func, args, current, root),
    }
}

fn eval_function(func: Func, args: &[Operand], current: &Value, root: &Value) -> Option<Value> {
    match func {
        Func::Length => {
            let value = eval_operand(args.first()?, current, root)?;
            let len = match &value {
                Value::String(s) => s.chars().count(),
                Value::Array(arr) => arr.len(),
                Value::Object(map) => map.len(),
                _ => return None,
            };
            Some(Value::Number(len.into()))
        }
        Func::Count => {
            let count = match args.first()? {
                Operand::Relative(query) => eval(query, current).len(),
                Operand::Absolute(query) => eval(query, root).len(),
                _ => return None,
            };
            Some(Value::Number(count.into()))
        }
        Func::Value => eval_operand(args.first()?, current, root),
        Func::Match | Func::Search => {
            let subject = eval_operand(args.first()?, current, root)?;
            let pattern = eval_operand(args.get(1)?, current, root)?;
            let (subject, pattern) = (subject.as_str()?, pattern.as_str()?);
            let anchored = if func == Func::Match {
                format!("^(?:{})$", pattern)
            } else {
                pattern.to_owned()
            };
            let re = regex::Regex::new(&anchored).ok()?;
            Some(Value::Bool(re.is_match(subject)))
        }
    }
}

fn compare(op: CmpOp, lhs: Option<Value>, rhs: Option<Value>) -> bool {
    match op {
        CmpOp::Eq => values_equal(&lhs, &rhs),
        CmpOp::Ne => !values_equal(&lhs, &rhs),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
                return false;
            };
            let ord = match (&lhs, &rhs) {
                (Value::Number(a), Value::Number(b)) => {
                    a.as_f64().partial_cmp(&b.as_f64())
                }
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            match ord {
                Some(ord) => match op {
                    CmpOp::Lt => ord == std::cmp::Ordering::Less,
                    CmpOp::Le => ord != std::cmp::Ordering::Greater,
                    CmpOp::Gt => ord == std::cmp::Ordering::Greater,
                    CmpOp::Ge => ord != std::cmp::Ordering::Less,
                    _ => unreachable!(),
                },
                None => false,
            }
        }
    }
}

fn values_equal(lhs: &Option<Value>, rhs: &Option<Value>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
            _ => a == b,
        },
        _ => false,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
