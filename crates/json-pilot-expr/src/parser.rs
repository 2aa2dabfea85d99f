//! Expression parser: tokens → AST.
//!
//! Precedence, lowest to highest: `?:`, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, postfix (member/index/call), primary.

use crate::error::ExprError;
use crate::lexer::{lex, Tok};
use serde_json::Value;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Lambda { params: Rc<Vec<String>>, body: Rc<Expr> },
    Unary(UnaryOp, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// Nesting cap for the parser itself; pathologically nested sources fail
/// with [`ExprError::RecursionLimit`] instead of exhausting the call stack.
const MAX_PARSE_DEPTH: usize = 200;

/// Parse an expression source string into an AST.
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let expr = parser.parse_cond()?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(ExprError::UnexpectedToken(tok.describe())),
    }
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            Err(ExprError::RecursionLimit)
        } else {
            Ok(())
        }
    }

    fn peek_at(&self, ahead: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + ahead)
    }

    fn advance(&mut self) -> Result<Tok, ExprError> {
        let tok = self.tokens.get(self.pos).cloned().ok_or(ExprError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<(), ExprError> {
        let found = self.advance()?;
        if &found == tok {
            Ok(())
        } else {
            Err(ExprError::UnexpectedToken(found.describe()))
        }
    }

    fn parse_cond(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let result = self.parse_cond_body();
        self.depth -= 1;
        result
    }

    fn parse_cond_body(&mut self) -> Result<Expr, ExprError> {
        let cond = self.parse_or()?;
        if self.eat(&Tok::Question) {
            let then = self.parse_cond()?;
            self.expect(&Tok::Colon)?;
            let otherwise = self.parse_cond()?;
            return Ok(Expr::Cond(Box::new(cond), Box::new(then), Box::new(otherwise)));
        }
        Ok(cond)
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.eat(&Tok::OrOr) {
            let right = self.parse_and()?;
            left = Expr::Binary(BinOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Tok::AndAnd) {
            let right = self.parse_equality()?;
            left = Expr::Binary(BinOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinOp::Eq,
                Some(Tok::NotEq) => BinOp::Ne,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_relational()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Lt) => BinOp::Lt,
                Some(Tok::Le) => BinOp::Le,
                Some(Tok::Gt) => BinOp::Gt,
                Some(Tok::Ge) => BinOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => BinOp::Add,
                Some(Tok::Minus) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => BinOp::Mul,
                Some(Tok::Slash) => BinOp::Div,
                Some(Tok::Percent) => BinOp::Rem,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        self.enter()?;
        let result = match self.peek() {
            Some(Tok::Not) => {
                self.pos += 1;
                self.parse_unary().map(|e| Expr::Unary(UnaryOp::Not, Box::new(e)))
            }
            Some(Tok::Minus) => {
                self.pos += 1;
                self.parse_unary().map(|e| Expr::Unary(UnaryOp::Neg, Box::new(e)))
            }
            _ => self.parse_postfix(),
        };
        self.depth -= 1;
        result
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Tok::Dot) => {
                    self.pos += 1;
                    match self.advance()? {
                        Tok::Ident(name) => expr = Expr::Member(Box::new(expr), name),
                        other => return Err(ExprError::UnexpectedToken(other.describe())),
                    }
                }
                Some(Tok::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_cond()?;
                    self.expect(&Tok::RBracket)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Some(Tok::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    loop {
                        if self.eat(&Tok::RParen) {
                            break;
                        }
                        args.push(self.parse_cond()?);
                        if !self.eat(&Tok::Comma) {
                            self.expect(&Tok::RParen)?;
                            break;
                        }
                    }
                    expr = Expr::Call { callee: Box::new(expr), args };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        // Lambda lookahead: `x =>` or `(a, b) =>`.
        if let Some(params) = self.try_lambda_params() {
            let body = self.parse_cond()?;
            return Ok(Expr::Lambda { params: Rc::new(params), body: Rc::new(body) });
        }

        match self.advance()? {
            Tok::Number(n) => Ok(Expr::Literal(number_literal(n))),
            Tok::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Tok::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                _ => Ok(Expr::Ident(name)),
            },
            Tok::LParen => {
                let inner = self.parse_cond()?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            Tok::LBracket => {
                let mut items = Vec::new();
                loop {
                    if self.eat(&Tok::RBracket) {
                        break;
                    }
                    items.push(self.parse_cond()?);
                    if !self.eat(&Tok::Comma) {
                        self.expect(&Tok::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::Array(items))
            }
            other => Err(ExprError::UnexpectedToken(other.describe())),
        }
    }

    /// If the upcoming tokens form a lambda parameter list followed by `=>`,
    /// consume through the arrow and return the parameter names.
    fn try_lambda_params(&mut self) -> Option<Vec<String>> {
        match self.peek() {
            Some(Tok::Ident(name)) => {
                if self.peek_at(1) == Some(&Tok::Arrow) {
                    let params = vec![name.clone()];
                    self.pos += 2;
                    return Some(params);
                }
                None
            }
            Some(Tok::LParen) => {
                let mut params = Vec::new();
                let mut i = 1;
                loop {
                    match self.peek_at(i) {
                        Some(Tok::RParen) => {
                            i += 1;
                            break;
                        }
                        Some(Tok::Ident(name)) => {
                            params.push(name.clone());
                            i += 1;
                            match self.peek_at(i) {
                                Some(Tok::Comma) => i += 1,
                                Some(Tok::RParen) => {}
                                _ => return None,
                            }
                        }
                        _ => return None,
                    }
                }
                if self.peek_at(i) == Some(&Tok::Arrow) {
                    self.pos += i + 1;
                    return Some(params);
                }
                None
            }
            _ => None,
        }
    }
}

/// Numbers parse as f64; integral values become JSON integers.
pub(crate) fn number_literal(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_member_chain() {
        let expr = parse_expression("data.a.b").unwrap();
        assert_eq!(
            expr,
            Expr::Member(
                Box::new(Expr::Member(Box::new(Expr::Ident("data".into())), "a".into())),
                "b".into()
            )
        );
    }

    #[test]
    fn test_parse_lambda_single_param() {
        let expr = parse_expression("i => i > 1").unwrap();
        let Expr::Lambda { params, body } = expr else {
            panic!("expected lambda");
        };
        assert_eq!(*params, vec!["i".to_string()]);
        assert!(matches!(*body, Expr::Binary(BinOp::Gt, _, _)));
    }

    #[test]
    fn test_parse_lambda_paren_params() {
        let expr = parse_expression("(a, b) => a + b").unwrap();
        let Expr::Lambda { params, .. } = expr else {
            panic!("expected lambda");
        };
        assert_eq!(*params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_paren_expr_is_not_lambda() {
        let expr = parse_expression("(data)").unwrap();
        assert_eq!(expr, Expr::Ident("data".into()));
    }

    #[test]
    fn test_parse_invoked_lambda() {
        let expr = parse_expression("(x => x.a)(data)").unwrap();
        assert!(matches!(expr, Expr::Call { .. }));
    }

    #[test]
    fn test_parse_conditional_precedence() {
        let expr = parse_expression("a ? 1 : b ? 2 : 3").unwrap();
        let Expr::Cond(_, _, otherwise) = expr else {
            panic!("expected conditional");
        };
        assert!(matches!(*otherwise, Expr::Cond(_, _, _)));
    }

    #[test]
    fn test_parse_array_literal() {
        let expr = parse_expression("[1, 'a', true]").unwrap();
        assert_eq!(
            expr,
            Expr::Array(vec![
                Expr::Literal(json!(1)),
                Expr::Literal(json!("a")),
                Expr::Literal(json!(true)),
            ])
        );
    }

    #[test]
    fn test_parse_rejects_trailing_tokens() {
        assert!(parse_expression("data data").is_err());
        assert!(parse_expression("").is_err());
    }

    #[test]
    fn test_parse_depth_limited() {
        let nested_parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse_expression(&nested_parens), Err(ExprError::RecursionLimit));
        let nested_arrays = format!("{}1{}", "[".repeat(10_000), "]".repeat(10_000));
        assert_eq!(parse_expression(&nested_arrays), Err(ExprError::RecursionLimit));
        assert_eq!(
            parse_expression(&"!".repeat(10_000)),
            Err(ExprError::RecursionLimit)
        );
        // Reasonable nesting still parses.
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert!(parse_expression(&shallow).is_ok());
    }
}
