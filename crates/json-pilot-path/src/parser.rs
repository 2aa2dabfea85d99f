//! Structural-path query parser.

use crate::types::*;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryParseError {
    #[error("query must start with '$'")]
    ExpectedRoot,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of query")]
    UnexpectedEnd,
    #[error("invalid number")]
    InvalidNumber,
    #[error("unclosed string literal")]
    UnclosedString,
    #[error("empty bracket selector")]
    EmptySelector,
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("trailing input after query")]
    TrailingInput,
    #[error("query nesting too deep")]
    TooDeep,
}

/// Filters and operands deeper than this fail with
/// [`QueryParseError::TooDeep`] instead of exhausting the call stack.
const MAX_DEPTH: usize = 200;

/// Parse a structural-path query string.
pub fn parse_query(input: &str) -> Result<PathQuery, QueryParseError> {
    let mut parser = Parser { input: input.as_bytes(), pos: 0, depth: 0 };
    parser.skip_ws();
    if !parser.eat(b'$') {
        return Err(QueryParseError::ExpectedRoot);
    }
    let query = parser.parse_segments()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(QueryParseError::TrailingInput);
    }
    Ok(query)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn enter(&mut self) -> Result<(), QueryParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(QueryParseError::TooDeep)
        } else {
            Ok(())
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), QueryParseError> {
        match self.peek() {
            Some(found) if found == b => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(QueryParseError::UnexpectedChar(found as char)),
            None => Err(QueryParseError::UnexpectedEnd),
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    /// Parse `.name`/`..name`/`[...]` steps until the path ends.
    fn parse_segments(&mut self) -> Result<PathQuery, QueryParseError> {
        let mut segments = Vec::new();
        loop {
            match self.peek() {
                Some(b'.') => {
                    self.pos += 1;
                    if self.eat(b'.') {
                        segments.push(Segment {
                            selectors: vec![self.parse_descent_selector()?],
                            recursive: true,
                        });
                    } else if self.eat(b'*') {
                        segments.push(Segment { selectors: vec![Selector::Wildcard], recursive: false });
                    } else {
                        let name = self.parse_identifier()?;
                        segments.push(Segment { selectors: vec![Selector::Name(name)], recursive: false });
                    }
                }
                Some(b'[') => {
                    segments.push(Segment { selectors: self.parse_bracket()?, recursive: false });
                }
                _ => break,
            }
        }
        Ok(PathQuery { segments })
    }

    /// The selector after `..`: a name, `*`, or a bracket selector.
    fn parse_descent_selector(&mut self) -> Result<Selector, QueryParseError> {
        match self.peek() {
            Some(b'*') => {
                self.pos += 1;
                Ok(Selector::Wildcard)
            }
            Some(b'[') => {
                let mut selectors = self.parse_bracket()?;
                Ok(selectors.remove(0))
            }
            _ => Ok(Selector::Name(self.parse_identifier()?)),
        }
    }

    fn parse_bracket(&mut self) -> Result<Vec<Selector>, QueryParseError> {
        self.expect(b'[')?;
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(QueryParseError::UnexpectedEnd),
                _ => {
                    selectors.push(self.parse_selector()?);
                    self.skip_ws();
                    self.eat(b',');
                }
            }
        }
        if selectors.is_empty() {
            return Err(QueryParseError::EmptySelector);
        }
        Ok(selectors)
    }

    fn parse_selector(&mut self) -> Result<Selector, QueryParseError> {
        match self.peek().ok_or(QueryParseError::UnexpectedEnd)? {
            b'*' => {
                self.pos += 1;
                Ok(Selector::Wildcard)
            }
            b'\'' | b'"' => Ok(Selector::Name(self.parse_string_literal()?)),
            b'?' => {
                self.pos += 1;
                self.skip_ws();
                Ok(Selector::Filter(self.parse_filter_or()?))
            }
            b':' | b'-' | b'0'..=b'9' => self.parse_index_or_slice(),
            other => Err(QueryParseError::UnexpectedChar(other as char)),
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<Selector, QueryParseError> {
        let start = if self.peek() == Some(b':') { None } else { Some(self.parse_int()?) };
        if !self.eat(b':') {
            return Ok(Selector::Index(start.ok_or(QueryParseError::InvalidNumber)?));
        }
        self.skip_ws();
        let end = match self.peek() {
            Some(b':' | b']') => None,
            _ => Some(self.parse_int()?),
        };
        let step = if self.eat(b':') {
            self.skip_ws();
            match self.peek() {
                Some(b']') => None,
                _ => Some(self.parse_int()?),
            }
        } else {
            None
        };
        Ok(Selector::Slice { start, end, step })
    }

    fn parse_int(&mut self) -> Result<isize, QueryParseError> {
        let start = self.pos;
        self.eat(b'-');
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(QueryParseError::InvalidNumber)
    }

    fn parse_identifier(&mut self) -> Result<String, QueryParseError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return match self.peek() {
                Some(b) => Err(QueryParseError::UnexpectedChar(b as char)),
                None => Err(QueryParseError::UnexpectedEnd),
            };
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn parse_string_literal(&mut self) -> Result<String, QueryParseError> {
        let quote = self.peek().ok_or(QueryParseError::UnexpectedEnd)?;
        self.pos += 1;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None => return Err(QueryParseError::UnclosedString),
                Some(b) if b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        Some(b'n') => out.push(b'\n'),
                        Some(b't') => out.push(b'\t'),
                        Some(b'r') => out.push(b'\r'),
                        Some(b) => out.push(b),
                        None => return Err(QueryParseError::UnclosedString),
                    }
                    self.pos += 1;
                }
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    // ---- filter expressions ----

    fn parse_filter_or(&mut self) -> Result<Filter, QueryParseError> {
        let mut left = self.parse_filter_and()?;
        loop {
            self.skip_ws();
            if self.peek() == Some(b'|') && self.input.get(self.pos + 1) == Some(&b'|') {
                self.pos += 2;
                self.skip_ws();
                let right = self.parse_filter_and()?;
                left = Filter::Or(Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_filter_and(&mut self) -> Result<Filter, QueryParseError> {
        let mut left = self.parse_filter_unary()?;
        loop {
            self.skip_ws();
            if self.peek() == Some(b'&') && self.input.get(self.pos + 1) == Some(&b'&') {
                self.pos += 2;
                self.skip_ws();
                let right = self.parse_filter_unary()?;
                left = Filter::And(Box::new(left), Box::new(right));
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_filter_unary(&mut self) -> Result<Filter, QueryParseError> {
        self.enter()?;
        let result = self.parse_filter_unary_body();
        self.depth -= 1;
        result
    }

    fn parse_filter_unary_body(&mut self) -> Result<Filter, QueryParseError> {
        self.skip_ws();
        match self.peek() {
            Some(b'!') => {
                self.pos += 1;
                Ok(Filter::Not(Box::new(self.parse_filter_unary()?)))
            }
            Some(b'(') => {
                self.pos += 1;
                let inner = self.parse_filter_or()?;
                self.skip_ws();
                self.expect(b')')?;
                Ok(inner)
            }
            _ => self.parse_comparison(),
        }
    }

    fn parse_comparison(&mut self) -> Result<Filter, QueryParseError> {
        let lhs = self.parse_operand()?;
        self.skip_ws();
        let op = match (self.peek(), self.input.get(self.pos + 1).copied()) {
            (Some(b'='), Some(b'=')) => Some((CmpOp::Eq, 2)),
            (Some(b'!'), Some(b'=')) => Some((CmpOp::Ne, 2)),
            (Some(b'<'), Some(b'=')) => Some((CmpOp::Le, 2)),
            (Some(b'>'), Some(b'=')) => Some((CmpOp::Ge, 2)),
            (Some(b'<'), _) => Some((CmpOp::Lt, 1)),
            (Some(b'>'), _) => Some((CmpOp::Gt, 1)),
            _ => None,
        };
        match op {
            Some((op, len)) => {
                self.pos += len;
                self.skip_ws();
                let rhs = self.parse_operand()?;
                Ok(Filter::Cmp { op, lhs, rhs })
            }
            None => Ok(Filter::Truthy(lhs)),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, QueryParseError> {
        self.enter()?;
        let result = self.parse_operand_body();
        self.depth -= 1;
        result
    }

    fn parse_operand_body(&mut self) -> Result<Operand, QueryParseError> {
        match self.peek().ok_or(QueryParseError::UnexpectedEnd)? {
            b'@' => {
                self.pos += 1;
                Ok(Operand::Relative(self.parse_segments()?))
            }
            b'$' => {
                self.pos += 1;
                Ok(Operand::Absolute(self.parse_segments()?))
            }
            b'\'' | b'"' => Ok(Operand::Literal(Value::String(self.parse_string_literal()?))),
            b'-' | b'0'..=b'9' => self.parse_number_literal(),
            _ => {
                let word = self.parse_identifier()?;
                match word.as_str() {
                    "true" => Ok(Operand::Literal(Value::Bool(true))),
                    "false" => Ok(Operand::Literal(Value::Bool(false))),
                    "null" => Ok(Operand::Literal(Value::Null)),
                    _ => {
                        let func = Func::from_name(&word)
                            .ok_or(QueryParseError::UnknownFunction(word))?;
                        self.skip_ws();
                        self.expect(b'(')?;
                        let mut args = Vec::new();
                        loop {
                            self.skip_ws();
                            if self.eat(b')') {
                                break;
                            }
                            args.push(self.parse_operand()?);
                            self.skip_ws();
                            self.eat(b',');
                        }
                        Ok(Operand::Call { func, args })
                    }
                }
            }
        }
    }

    fn parse_number_literal(&mut self) -> Result<Operand, QueryParseError> {
        let start = self.pos;
        self.eat(b'-');
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.eat(b'.') {
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let text = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| QueryParseError::InvalidNumber)?;
        serde_json::from_str(text)
            .map(Operand::Literal)
            .map_err(|_| QueryParseError::InvalidNumber)
    }
}
