//! Tree-walking evaluator.
//!
//! Evaluation is pure: the only reachable state is the bound document and
//! the expression's own literals. `undefined` is a first-class value so
//! missing members behave the way query authors expect.

use crate::error::ExprError;
use crate::parser::{number_literal, BinOp, Expr, UnaryOp};
use serde_json::Value;
use std::rc::Rc;

const MAX_DEPTH: usize = 200;

/// Runtime value: JSON, `undefined`, or a lambda.
#[derive(Debug, Clone)]
pub enum ExprValue {
    Undefined,
    Json(Value),
    Lambda { params: Rc<Vec<String>>, body: Rc<Expr> },
}

impl ExprValue {
    /// JSON form of the value; `None` for `undefined` and lambdas
    /// (mirroring what serializing them would produce).
    pub fn into_json(self) -> Option<Value> {
        match self {
            ExprValue::Json(value) => Some(value),
            ExprValue::Undefined | ExprValue::Lambda { .. } => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            ExprValue::Undefined => "undefined",
            ExprValue::Lambda { .. } => "function",
            ExprValue::Json(Value::Null) => "null",
            ExprValue::Json(Value::Bool(_)) => "boolean",
            ExprValue::Json(Value::Number(_)) => "number",
            ExprValue::Json(Value::String(_)) => "string",
            ExprValue::Json(Value::Array(_)) => "array",
            ExprValue::Json(Value::Object(_)) => "object",
        }
    }
}

/// Binding scope: a plain stack of name/value frames.
struct Scope {
    frames: Vec<(String, ExprValue)>,
}

impl Scope {
    fn lookup(&self, name: &str) -> Option<&ExprValue> {
        self.frames.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Evaluate `source` with `name` bound to `doc`.
pub fn evaluate(source: &str, name: &str, doc: &Value) -> Result<ExprValue, ExprError> {
    let expr = crate::parser::parse_expression(source)?;
    let mut scope = Scope {
        frames: vec![(name.to_owned(), ExprValue::Json(doc.clone()))],
    };
    eval_expr(&expr, &mut scope, 0)
}

fn eval_expr(expr: &Expr, scope: &mut Scope, depth: usize) -> Result<ExprValue, ExprError> {
    if depth > MAX_DEPTH {
        return Err(ExprError::RecursionLimit);
    }
    match expr {
        Expr::Literal(value) => Ok(ExprValue::Json(value.clone())),
        Expr::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                // JS would hold `undefined` slots; JSON arrays hold null.
                out.push(eval_expr(item, scope, depth + 1)?.into_json().unwrap_or(Value::Null));
            }
            Ok(ExprValue::Json(Value::Array(out)))
        }
        Expr::Ident(name) => scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| ExprError::UnknownIdentifier(name.clone())),
        Expr::Member(recv, name) => {
            let recv = eval_expr(recv, scope, depth + 1)?;
            Ok(member(&recv, name))
        }
        Expr::Index(recv, index) => {
            let recv = eval_expr(recv, scope, depth + 1)?;
            let index = eval_expr(index, scope, depth + 1)?;
            Ok(indexed(&recv, &index))
        }
        Expr::Lambda { params, body } => Ok(ExprValue::Lambda {
            params: Rc::clone(params),
            body: Rc::clone(body),
        }),
        Expr::Cond(cond, then, otherwise) => {
            let cond = eval_expr(cond, scope, depth + 1)?;
            if is_truthy(&cond) {
                eval_expr(then, scope, depth + 1)
            } else {
                eval_expr(otherwise, scope, depth + 1)
            }
        }
        Expr::Unary(op, inner) => {
            let value = eval_expr(inner, scope, depth + 1)?;
            Ok(match op {
                UnaryOp::Not => ExprValue::Json(Value::Bool(!is_truthy(&value))),
                UnaryOp::Neg => ExprValue::Json(number_literal(-to_number(&value))),
            })
        }
        Expr::Binary(op, lhs, rhs) => eval_binary(*op, lhs, rhs, scope, depth),
        Expr::Call { callee, args } => {
            // Method-call form dispatches to the builtin set.
            if let Expr::Member(recv, name) = callee.as_ref() {
                let recv = eval_expr(recv, scope, depth + 1)?;
                let mut call_args = Vec::with_capacity(args.len());
                for arg in args {
                    call_args.push(eval_expr(arg, scope, depth + 1)?);
                }
                return call_method(&recv, name, &call_args, scope, depth);
            }
            let callee = eval_expr(callee, scope, depth + 1)?;
            match callee {
                ExprValue::Lambda { params, body } => {
                    let mut call_args = Vec::with_capacity(args.len());
                    for arg in args {
                        call_args.push(eval_expr(arg, scope, depth + 1)?);
                    }
                    apply(&params, &body, call_args, scope, depth)
                }
                other => Err(ExprError::NotCallable(other.type_name().to_owned())),
            }
        }
    }
}

fn apply(
    params: &[String],
    body: &Expr,
    args: Vec<ExprValue>,
    scope: &mut Scope,
    depth: usize,
) -> Result<ExprValue, ExprError> {
    let base = scope.frames.len();
    for (i, param) in params.iter().enumerate() {
        let arg = args.get(i).cloned().unwrap_or(ExprValue::Undefined);
        scope.frames.push((param.clone(), arg));
    }
    let result = eval_expr(body, scope, depth + 1);
    scope.frames.truncate(base);
    result
}

fn member(recv: &ExprValue, name: &str) -> ExprValue {
    match recv {
        ExprValue::Json(Value::Object(map)) => match map.get(name) {
            Some(value) => ExprValue::Json(value.clone()),
            None => ExprValue::Undefined,
        },
        ExprValue::Json(Value::Array(arr)) if name == "length" => {
            ExprValue::Json(Value::Number(arr.len().into()))
        }
        ExprValue::Json(Value::String(s)) if name == "length" => {
            ExprValue::Json(Value::Number(s.chars().count().into()))
        }
        _ => ExprValue::Undefined,
    }
}

fn indexed(recv: &ExprValue, index: &ExprValue) -> ExprValue {
    match recv {
        ExprValue::Json(Value::Array(arr)) => {
            let Some(idx) = array_index(index, arr.len()) else {
                return ExprValue::Undefined;
            };
            arr.get(idx).map(|v| ExprValue::Json(v.clone())).unwrap_or(ExprValue::Undefined)
        }
        ExprValue::Json(Value::Object(map)) => match index {
            ExprValue::Json(Value::String(key)) => map
                .get(key)
                .map(|v| ExprValue::Json(v.clone()))
                .unwrap_or(ExprValue::Undefined),
            _ => ExprValue::Undefined,
        },
        ExprValue::Json(Value::String(s)) => {
            let Some(idx) = array_index(index, s.chars().count()) else {
                return ExprValue::Undefined;
            };
            s.chars()
                .nth(idx)
                .map(|c| ExprValue::Json(Value::String(c.to_string())))
                .unwrap_or(ExprValue::Undefined)
        }
        _ => ExprValue::Undefined,
    }
}

/// Numeric index; negative counts from the end.
fn array_index(index: &ExprValue, len: usize) -> Option<usize> {
    let n = to_number(index);
    if n.is_nan() || n.fract() != 0.0 {
        return None;
    }
    let n = n as i64;
    if n < 0 {
        len.checked_sub(n.unsigned_abs() as usize)
    } else {
        Some(n as usize)
    }
}

fn eval_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &mut Scope,
    depth: usize,
) -> Result<ExprValue, ExprError> {
    // Short-circuit forms return the deciding operand, as in JS.
    if op == BinOp::Or {
        let left = eval_expr(lhs, scope, depth + 1)?;
        return if is_truthy(&left) { Ok(left) } else { eval_expr(rhs, scope, depth + 1) };
    }
    if op == BinOp::And {
        let left = eval_expr(lhs, scope, depth + 1)?;
        return if is_truthy(&left) { eval_expr(rhs, scope, depth + 1) } else { Ok(left) };
    }

    let left = eval_expr(lhs, scope, depth + 1)?;
    let right = eval_expr(rhs, scope, depth + 1)?;
    let result = match op {
        BinOp::Eq => Value::Bool(loose_eq(&left, &right)),
        BinOp::Ne => Value::Bool(!loose_eq(&left, &right)),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            Value::Bool(relational(op, &left, &right))
        }
        BinOp::Add => {
            if let (ExprValue::Json(Value::String(_)), _) | (_, ExprValue::Json(Value::String(_))) =
                (&left, &right)
            {
                Value::String(format!("{}{}", to_display(&left), to_display(&right)))
            } else {
                number_literal(to_number(&left) + to_number(&right))
            }
        }
        BinOp::Sub => number_literal(to_number(&left) - to_number(&right)),
        BinOp::Mul => number_literal(to_number(&left) * to_number(&right)),
        BinOp::Div => number_literal(to_number(&left) / to_number(&right)),
        BinOp::Rem => number_literal(to_number(&left) % to_number(&right)),
        BinOp::Or | BinOp::And => unreachable!(),
    };
    Ok(ExprValue::Json(result))
}

fn relational(op: BinOp, left: &ExprValue, right: &ExprValue) -> bool {
    if let (ExprValue::Json(Value::String(a)), ExprValue::Json(Value::String(b))) = (left, right) {
        return match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => false,
        };
    }
    let (a, b) = (to_number(left), to_number(right));
    if a.is_nan() || b.is_nan() {
        return false;
    }
    match op {
        BinOp::Lt => a < b,
        BinOp::Le => a <= b,
        BinOp::Gt => a > b,
        BinOp::Ge => a >= b,
        _ => false,
    }
}

/// Loose equality over JSON values: `undefined == null`, numbers compare
/// by value, everything else structurally.
fn loose_eq(left: &ExprValue, right: &ExprValue) -> bool {
    match (left, right) {
        (ExprValue::Undefined, ExprValue::Undefined) => true,
        (ExprValue::Undefined, ExprValue::Json(Value::Null)) => true,
        (ExprValue::Json(Value::Null), ExprValue::Undefined) => true,
        (ExprValue::Json(a), ExprValue::Json(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
            (Value::Number(x), Value::String(s)) | (Value::String(s), Value::Number(x)) => {
                s.trim().parse::<f64>().ok() == x.as_f64()
            }
            _ => a == b,
        },
        _ => false,
    }
}

pub(crate) fn is_truthy(value: &ExprValue) -> bool {
    match value {
        ExprValue::Undefined => false,
        ExprValue::Lambda { .. } => true,
        ExprValue::Json(json) => match json {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        },
    }
}

fn to_number(value: &ExprValue) -> f64 {
    match value {
        ExprValue::Undefined | ExprValue::Lambda { .. } => f64::NAN,
        ExprValue::Json(json) => match json {
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(_) | Value::Object(_) => f64::NAN,
        },
    }
}

/// String form used by `+` concatenation and `join`.
fn to_display(value: &ExprValue) -> String {
    match value {
        ExprValue::Undefined => "undefined".to_owned(),
        ExprValue::Lambda { .. } => "[function]".to_owned(),
        ExprValue::Json(json) => match json {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_owned(),
            other => serde_json::to_string(other).unwrap_or_default(),
        },
    }
}

// ---- builtin methods ----

fn call_method(
    recv: &ExprValue,
    name: &str,
    args: &[ExprValue],
    scope: &mut Scope,
    depth: usize,
) -> Result<ExprValue, ExprError> {
    match recv {
        ExprValue::Json(Value::Array(arr)) => array_method(arr, name, args, scope, depth),
        ExprValue::Json(Value::String(s)) => string_method(s, name, args),
        ExprValue::Json(Value::Object(map)) => object_method(map, name),
        _ => Err(ExprError::UnknownMethod(name.to_owned())),
    }
}

fn expect_lambda<'a>(
    args: &'a [ExprValue],
    method: &str,
) -> Result<(&'a Rc<Vec<String>>, &'a Rc<Expr>), ExprError> {
    match args.first() {
        Some(ExprValue::Lambda { params, body }) => Ok((params, body)),
        _ => Err(ExprError::ArityError(format!("{} expects a function argument", method))),
    }
}

fn array_method(
    arr: &[Value],
    name: &str,
    args: &[ExprValue],
    scope: &mut Scope,
    depth: usize,
) -> Result<ExprValue, ExprError> {
    // Callbacks receive (element, index), as in JS.
    let call = |scope: &mut Scope,
                params: &Rc<Vec<String>>,
                body: &Rc<Expr>,
                item: &Value,
                idx: usize|
     -> Result<ExprValue, ExprError> {
        apply(
            params,
            body,
            vec![
                ExprValue::Json(item.clone()),
                ExprValue::Json(Value::Number(idx.into())),
            ],
            scope,
            depth,
        )
    };

    match name {
        "filter" => {
            let (params, body) = expect_lambda(args, "filter")?;
            let mut out = Vec::new();
            for (i, item) in arr.iter().enumerate() {
                if is_truthy(&call(scope, params, body, item, i)?) {
                    out.push(item.clone());
                }
            }
            Ok(ExprValue::Json(Value::Array(out)))
        }
        "map" => {
            let (params, body) = expect_lambda(args, "map")?;
            let mut out = Vec::new();
            for (i, item) in arr.iter().enumerate() {
                out.push(call(scope, params, body, item, i)?.into_json().unwrap_or(Value::Null));
            }
            Ok(ExprValue::Json(Value::Array(out)))
        }
        "find" => {
            let (params, body) = expect_lambda(args, "find")?;
            for (i, item) in arr.iter().enumerate() {
                if is_truthy(&call(scope, params, body, item, i)?) {
                    return Ok(ExprValue::Json(item.clone()));
                }
            }
            Ok(ExprValue::Undefined)
        }
        "findIndex" => {
            let (params, body) = expect_lambda(args, "findIndex")?;
            for (i, item) in arr.iter().enumerate() {
                if is_truthy(&call(scope, params, body, item, i)?) {
                    return Ok(ExprValue::Json(Value::Number(i.into())));
                }
            }
            Ok(ExprValue::Json(number_literal(-1.0)))
        }
        "some" => {
            let (params, body) = expect_lambda(args, "some")?;
            for (i, item) in arr.iter().enumerate() {
                if is_truthy(&call(scope, params, body, item, i)?) {
                    return Ok(ExprValue::Json(Value::Bool(true)));
                }
            }
            Ok(ExprValue::Json(Value::Bool(false)))
        }
        "every" => {
            let (params, body) = expect_lambda(args, "every")?;
            for (i, item) in arr.iter().enumerate() {
                if !is_truthy(&call(scope, params, body, item, i)?) {
                    return Ok(ExprValue::Json(Value::Bool(false)));
                }
            }
            Ok(ExprValue::Json(Value::Bool(true)))
        }
        "includes" => {
            let needle = args.first().cloned().unwrap_or(ExprValue::Undefined);
            let found = arr.iter().any(|item| loose_eq(&ExprValue::Json(item.clone()), &needle));
            Ok(ExprValue::Json(Value::Bool(found)))
        }
        "indexOf" => {
            let needle = args.first().cloned().unwrap_or(ExprValue::Undefined);
            let idx = arr
                .iter()
                .position(|item| loose_eq(&ExprValue::Json(item.clone()), &needle))
                .map(|i| i as f64)
                .unwrap_or(-1.0);
            Ok(ExprValue::Json(number_literal(idx)))
        }
        "slice" => {
            let (start, end) = slice_bounds(args, arr.len());
            Ok(ExprValue::Json(Value::Array(arr[start..end].to_vec())))
        }
        "join" => {
            let sep = match args.first() {
                Some(ExprValue::Json(Value::String(s))) => s.clone(),
                Some(other) => to_display(other),
                None => ",".to_owned(),
            };
            let joined = arr
                .iter()
                .map(|v| match v {
                    Value::Null => String::new(),
                    other => to_display(&ExprValue::Json(other.clone())),
                })
                .collect::<Vec<_>>()
                .join(&sep);
            Ok(ExprValue::Json(Value::String(joined)))
        }
        "concat" => {
            let mut out = arr.to_vec();
            for arg in args {
                match arg {
                    ExprValue::Json(Value::Array(more)) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone().into_json().unwrap_or(Value::Null)),
                }
            }
            Ok(ExprValue::Json(Value::Array(out)))
        }
        "reverse" => {
            let mut out = arr.to_vec();
            out.reverse();
            Ok(ExprValue::Json(Value::Array(out)))
        }
        "flat" => {
            let levels = args.first().map(to_number).unwrap_or(1.0);
            let levels = if levels.is_nan() { 1 } else { levels.max(0.0) as usize };
            Ok(ExprValue::Json(Value::Array(flatten(arr, levels))))
        }
        other => Err(ExprError::UnknownMethod(other.to_owned())),
    }
}

fn flatten(arr: &[Value], levels: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        match item {
            Value::Array(inner) if levels > 0 => out.extend(flatten(inner, levels - 1)),
            other => out.push(other.clone()),
        }
    }
    out
}

fn slice_bounds(args: &[ExprValue], len: usize) -> (usize, usize) {
    let resolve = |value: Option<&ExprValue>, default: usize| -> usize {
        match value {
            Some(v) => {
                let n = to_number(v);
                if n.is_nan() {
                    return default;
                }
                if n < 0.0 {
                    len.saturating_sub(n.abs() as usize)
                } else {
                    (n as usize).min(len)
                }
            }
            None => default,
        }
    };
    let start = resolve(args.first(), 0);
    let end = resolve(args.get(1), len);
    (start, end.max(start))
}

fn string_method(s: &str, name: &str, args: &[ExprValue]) -> Result<ExprValue, ExprError> {
    let arg_str = |i: usize| -> String {
        match args.get(i) {
            Some(ExprValue::Json(Value::String(s))) => s.clone(),
            Some(other) => to_display(other),
            None => String::new(),
        }
    };
    match name {
        "includes" => Ok(ExprValue::Json(Value::Bool(s.contains(&arg_str(0))))),
        "startsWith" => Ok(ExprValue::Json(Value::Bool(s.starts_with(&arg_str(0))))),
        "endsWith" => Ok(ExprValue::Json(Value::Bool(s.ends_with(&arg_str(0))))),
        "toUpperCase" => Ok(ExprValue::Json(Value::String(s.to_uppercase()))),
        "toLowerCase" => Ok(ExprValue::Json(Value::String(s.to_lowercase()))),
        "trim" => Ok(ExprValue::Json(Value::String(s.trim().to_owned()))),
        "split" => {
            let sep = arg_str(0);
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(&sep).map(|p| Value::String(p.to_owned())).collect()
            };
            Ok(ExprValue::Json(Value::Array(parts)))
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(args, chars.len());
            Ok(ExprValue::Json(Value::String(chars[start..end].iter().collect())))
        }
        other => Err(ExprError::UnknownMethod(other.to_owned())),
    }
}

fn object_method(
    map: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<ExprValue, ExprError> {
    match name {
        "keys" => Ok(ExprValue::Json(Value::Array(
            map.keys().map(|k| Value::String(k.clone())).collect(),
        ))),
        "values" => Ok(ExprValue::Json(Value::Array(map.values().cloned().collect()))),
        other => Err(ExprError::UnknownMethod(other.to_owned())),
    }
}
