//! Expression tokenizer.

use crate::error::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    /// `=>`
    Arrow,
    Question,
    Colon,
    OrOr,
    AndAnd,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
}

impl Tok {
    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Tok::Number(n) => n.to_string(),
            Tok::Str(s) => format!("{:?}", s),
            Tok::Ident(name) => name.clone(),
            Tok::LParen => "(".into(),
            Tok::RParen => ")".into(),
            Tok::LBracket => "[".into(),
            Tok::RBracket => "]".into(),
            Tok::Dot => ".".into(),
            Tok::Comma => ",".into(),
            Tok::Arrow => "=>".into(),
            Tok::Question => "?".into(),
            Tok::Colon => ":".into(),
            Tok::OrOr => "||".into(),
            Tok::AndAnd => "&&".into(),
            Tok::EqEq => "==".into(),
            Tok::NotEq => "!=".into(),
            Tok::Lt => "<".into(),
            Tok::Le => "<=".into(),
            Tok::Gt => ">".into(),
            Tok::Ge => ">=".into(),
            Tok::Plus => "+".into(),
            Tok::Minus => "-".into(),
            Tok::Star => "*".into(),
            Tok::Slash => "/".into(),
            Tok::Percent => "%".into(),
            Tok::Not => "!".into(),
        }
    }
}

pub fn lex(source: &str) -> Result<Vec<Tok>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '(' => push1(&mut chars, &mut tokens, Tok::LParen),
            ')' => push1(&mut chars, &mut tokens, Tok::RParen),
            '[' => push1(&mut chars, &mut tokens, Tok::LBracket),
            ']' => push1(&mut chars, &mut tokens, Tok::RBracket),
            '.' => push1(&mut chars, &mut tokens, Tok::Dot),
            ',' => push1(&mut chars, &mut tokens, Tok::Comma),
            '?' => push1(&mut chars, &mut tokens, Tok::Question),
            ':' => push1(&mut chars, &mut tokens, Tok::Colon),
            '+' => push1(&mut chars, &mut tokens, Tok::Plus),
            '-' => push1(&mut chars, &mut tokens, Tok::Minus),
            '*' => push1(&mut chars, &mut tokens, Tok::Star),
            '/' => push1(&mut chars, &mut tokens, Tok::Slash),
            '%' => push1(&mut chars, &mut tokens, Tok::Percent),
            '=' => {
                chars.next();
                match chars.peek() {
                    Some('>') => {
                        chars.next();
                        tokens.push(Tok::Arrow);
                    }
                    Some('=') => {
                        chars.next();
                        // Accept `===` as `==`; strictness is meaningless
                        // on pure JSON values.
                        if chars.peek() == Some(&'=') {
                            chars.next();
                        }
                        tokens.push(Tok::EqEq);
                    }
                    _ => return Err(ExprError::UnexpectedChar('=')),
                }
            }
            '!' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    if chars.peek() == Some(&'=') {
                        chars.next();
                    }
                    tokens.push(Tok::NotEq);
                } else {
                    tokens.push(Tok::Not);
                }
            }
            '<' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Tok::Le);
                } else {
                    tokens.push(Tok::Lt);
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Tok::Ge);
                } else {
                    tokens.push(Tok::Gt);
                }
            }
            '&' => {
                chars.next();
                if chars.next() == Some('&') {
                    tokens.push(Tok::AndAnd);
                } else {
                    return Err(ExprError::UnexpectedChar('&'));
                }
            }
            '|' => {
                chars.next();
                if chars.next() == Some('|') {
                    tokens.push(Tok::OrOr);
                } else {
                    return Err(ExprError::UnexpectedChar('|'));
                }
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut out = String::new();
                loop {
                    match chars.next() {
                        None => return Err(ExprError::UnclosedString),
                        Some(c) if c == quote => break,
                        Some('\\') => match chars.next() {
                            Some('n') => out.push('\n'),
                            Some('t') => out.push('\t'),
                            Some('r') => out.push('\r'),
                            Some(c) => out.push(c),
                            None => return Err(ExprError::UnclosedString),
                        },
                        Some(c) => out.push(c),
                    }
                }
                tokens.push(Tok::Str(out));
            }
            '0'..='9' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' {
                        text.push(c);
                        chars.next();
                        // Exponent sign.
                        if (c == 'e' || c == 'E')
                            && matches!(chars.peek(), Some('+' | '-'))
                        {
                            if let Some(sign) = chars.next() {
                                text.push(sign);
                            }
                        }
                    } else {
                        break;
                    }
                }
                let n: f64 = text.parse().map_err(|_| ExprError::InvalidNumber)?;
                tokens.push(Tok::Number(n));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '$' {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Tok::Ident(name));
            }
            other => return Err(ExprError::UnexpectedChar(other)),
        }
    }
    Ok(tokens)
}

fn push1(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    tokens: &mut Vec<Tok>,
    tok: Tok,
) {
    chars.next();
    tokens.push(tok);
}
