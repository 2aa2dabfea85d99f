//! Position-accurate parse tree for JSON-with-comments documents.
//!
//! The tree is an arena of nodes indexed by [`NodeId`]; every node carries
//! the byte range it was parsed from, so a tree is only valid against the
//! exact text snapshot that produced it. Parsing is tolerant: comments,
//! trailing commas, missing commas and dangling keys are recovered so that
//! overlay computation keeps working on "almost valid" documents. [`parse`]
//! returns `None` only when no root value can be recognized at all, or when
//! container nesting exceeds a fixed cap.

use crate::path::PathSegment;
use crate::scanner::{Scanner, Token, TokenKind};
use serde_json::Value;

/// Index of a node within its [`ParseTree`] arena.
pub type NodeId = usize;

/// Structural class of a parse node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    /// A `key: value` member of an object. Children are `[key, value]`;
    /// the value child is absent when the member is still being typed.
    Property,
}

impl NodeKind {
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Object | NodeKind::Array)
    }
}

/// A node of the parse tree.
#[derive(Debug, Clone)]
pub struct ParseNode {
    pub kind: NodeKind,
    /// Byte offset of the node's first character (`{`, `[`, the opening
    /// quote, or the first character of a scalar token).
    pub offset: usize,
    /// Byte length of the node's full text range.
    pub length: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Decoded value for scalar nodes (string content is unescaped).
    pub scalar: Option<Value>,
}

impl ParseNode {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Arena-backed parse tree.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    root: NodeId,
}

impl ParseTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ParseNode {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// The unescaped key of a property node.
    pub fn property_key(&self, property: NodeId) -> Option<&str> {
        let node = &self.nodes[property];
        if node.kind != NodeKind::Property {
            return None;
        }
        let key = *node.children.first()?;
        self.nodes[key].scalar.as_ref()?.as_str()
    }

    /// The value child of a property node, if present.
    pub fn property_value(&self, property: NodeId) -> Option<NodeId> {
        let node = &self.nodes[property];
        if node.kind != NodeKind::Property {
            return None;
        }
        node.children.get(1).copied()
    }

    /// Whether `id` sits in the property-name slot of its parent.
    pub fn is_property_name(&self, id: NodeId) -> bool {
        match self.nodes[id].parent {
            Some(parent) => {
                self.nodes[parent].kind == NodeKind::Property
                    && self.nodes[parent].children.first() == Some(&id)
            }
            None => false,
        }
    }

    /// Resolve a structural path to a node. An empty path is the root.
    /// Yields exactly one node or nothing; paths are never ambiguous.
    pub fn find_node_at_path(&self, path: &[PathSegment]) -> Option<NodeId> {
        let mut cur = self.root;
        for segment in path {
            cur = match (self.nodes[cur].kind, segment) {
                (NodeKind::Object, PathSegment::Key(key)) => {
                    let property = self.nodes[cur]
                        .children
                        .iter()
                        .copied()
                        .find(|&p| self.property_key(p) == Some(key.as_str()))?;
                    self.property_value(property)?
                }
                (NodeKind::Array, PathSegment::Index(index)) => {
                    *self.nodes[cur].children.get(*index)?
                }
                _ => return None,
            };
        }
        Some(cur)
    }

    /// Deepest node whose byte range contains `offset`.
    pub fn find_node_at_offset(&self, offset: usize) -> Option<NodeId> {
        let root = &self.nodes[self.root];
        if offset < root.offset || offset >= root.end() {
            return None;
        }
        let mut cur = self.root;
        'descend: loop {
            for &child in &self.nodes[cur].children {
                let node = &self.nodes[child];
                if offset >= node.offset && offset < node.end() {
                    cur = child;
                    continue 'descend;
                }
            }
            return Some(cur);
        }
    }

    /// Reconstruct the structural path of a node by walking parent links.
    pub fn path_of(&self, id: NodeId) -> Vec<PathSegment> {
        let mut segments = Vec::new();
        let mut cur = id;
        while let Some(parent) = self.nodes[cur].parent {
            match self.nodes[parent].kind {
                NodeKind::Array => {
                    let index = self.nodes[parent]
                        .children
                        .iter()
                        .position(|&c| c == cur)
                        .unwrap_or(0);
                    segments.push(PathSegment::Index(index));
                }
                NodeKind::Property => {
                    if let Some(key) = self.property_key(parent) {
                        segments.push(PathSegment::Key(key.to_owned()));
                    }
                }
                _ => {}
            }
            cur = parent;
        }
        segments.reverse();
        segments
    }

    /// Reconstitute the JSON value of a subtree.
    pub fn node_value(&self, id: NodeId) -> Value {
        let node = &self.nodes[id];
        match node.kind {
            NodeKind::Object => {
                let mut map = serde_json::Map::new();
                for &property in &node.children {
                    if let (Some(key), Some(value)) =
                        (self.property_key(property), self.property_value(property))
                    {
                        map.insert(key.to_owned(), self.node_value(value));
                    }
                }
                Value::Object(map)
            }
            NodeKind::Array => {
                Value::Array(node.children.iter().map(|&c| self.node_value(c)).collect())
            }
            NodeKind::Property => match self.property_value(id) {
                Some(value) => self.node_value(value),
                None => Value::Null,
            },
            _ => node.scalar.clone().unwrap_or(Value::Null),
        }
    }
}

/// Containers deeper than this make [`parse`] give up rather than blow
/// the call stack; the caller simply skips overlay work for that revision.
const MAX_NESTING: usize = 512;

/// Tolerant parse of a document snapshot.
pub fn parse(text: &str) -> Option<ParseTree> {
    let mut scanner = Scanner::new(text);
    let mut tokens = Vec::new();
    while let Some(token) = scanner.next_token() {
        if !token.kind.is_trivia() {
            tokens.push(token);
        }
    }

    let mut parser = Parser {
        text,
        tokens,
        pos: 0,
        last_end: 0,
        nodes: Vec::new(),
        too_deep: false,
    };
    // The document must open with something that can start a value.
    if !parser.peek().is_some_and(starts_value) {
        return None;
    }
    let root = parser.parse_value(0)?;
    if parser.too_deep {
        return None;
    }
    Some(ParseTree { nodes: parser.nodes, root })
}

fn starts_value(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::OpenBrace
            | TokenKind::OpenBracket
            | TokenKind::String
            | TokenKind::Number
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
    )
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// End offset of the last consumed token, used to close container ranges.
    last_end: usize,
    nodes: Vec<ParseNode>,
    /// Set when nesting exceeds [`MAX_NESTING`]; the whole parse is discarded.
    too_deep: bool,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        self.last_end = token.end();
        token
    }

    fn add_node(&mut self, kind: NodeKind, offset: usize, length: usize) -> NodeId {
        self.nodes.push(ParseNode {
            kind,
            offset,
            length,
            parent: None,
            children: Vec::new(),
            scalar: None,
        });
        self.nodes.len() - 1
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn token_text(&self, token: Token) -> &'a str {
        &self.text[token.offset..token.end()]
    }

    fn parse_value(&mut self, depth: usize) -> Option<NodeId> {
        if depth > MAX_NESTING {
            self.too_deep = true;
            return None;
        }
        match self.peek()? {
            TokenKind::OpenBrace => Some(self.parse_object(depth)),
            TokenKind::OpenBracket => Some(self.parse_array(depth)),
            TokenKind::String => Some(self.parse_string_node()),
            TokenKind::Number => {
                let token = self.advance();
                let id = self.add_node(NodeKind::Number, token.offset, token.len);
                self.nodes[id].scalar = serde_json::from_str(self.token_text(token)).ok();
                Some(id)
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                let id = self.add_node(NodeKind::Boolean, token.offset, token.len);
                self.nodes[id].scalar = Some(Value::Bool(token.kind == TokenKind::True));
                Some(id)
            }
            TokenKind::Null => {
                let token = self.advance();
                let id = self.add_node(NodeKind::Null, token.offset, token.len);
                self.nodes[id].scalar = Some(Value::Null);
                Some(id)
            }
            _ => None,
        }
    }

    fn parse_string_node(&mut self) -> NodeId {
        let token = self.advance();
        let id = self.add_node(NodeKind::String, token.offset, token.len);
        let content = unescape_string_token(self.token_text(token));
        self.nodes[id].scalar = Some(Value::String(content));
        id
    }

    fn parse_object(&mut self, depth: usize) -> NodeId {
        let open = self.advance();
        let id = self.add_node(NodeKind::Object, open.offset, 0);
        loop {
            if self.too_deep {
                break;
            }
            match self.peek() {
                None => break,
                Some(TokenKind::CloseBrace) => {
                    self.advance();
                    break;
                }
                // Tolerates leading, duplicate and trailing commas.
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(TokenKind::String) => {
                    let property = self.parse_property(depth);
                    self.attach(id, property);
                }
                // Stray token in member position: skip it and keep going.
                Some(_) => {
                    self.advance();
                }
            }
        }
        self.nodes[id].length = self.last_end - open.offset;
        id
    }

    fn parse_property(&mut self, depth: usize) -> NodeId {
        let key_offset = self.tokens[self.pos].offset;
        let property = self.add_node(NodeKind::Property, key_offset, 0);
        let key = self.parse_string_node();
        self.attach(property, key);
        if self.peek() == Some(TokenKind::Colon) {
            self.advance();
            // A dangling `"key":` keeps the property without a value child.
            if self.peek().is_some_and(starts_value) {
                if let Some(value) = self.parse_value(depth + 1) {
                    self.attach(property, value);
                }
            }
        }
        self.nodes[property].length = self.last_end - key_offset;
        property
    }

    fn parse_array(&mut self, depth: usize) -> NodeId {
        let open = self.advance();
        let id = self.add_node(NodeKind::Array, open.offset, 0);
        loop {
            if self.too_deep {
                break;
            }
            match self.peek() {
                None => break,
                Some(TokenKind::CloseBracket) => {
                    self.advance();
                    break;
                }
                Some(TokenKind::Comma) => {
                    self.advance();
                }
                Some(kind) if starts_value(kind) => {
                    if let Some(value) = self.parse_value(depth + 1) {
                        self.attach(id, value);
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        self.nodes[id].length = self.last_end - open.offset;
        id
    }
}

/// Unescape the content of a raw string token (quotes included). The token
/// may be unterminated; invalid escapes are kept verbatim.
pub fn unescape_string_token(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .unwrap_or(raw);
    // The final quote terminates the token only when preceded by an even
    // run of backslashes; in `"C:\\"` it follows an escaped backslash and
    // is a real terminator, while in `"C:\"` it is itself escaped.
    let inner = match inner.strip_suffix('"') {
        Some(body) if trailing_backslashes(body) % 2 == 0 => body,
        _ => inner,
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => match parse_hex4(&mut chars) {
                Some(high @ 0xD800..=0xDBFF) => {
                    // Surrogate pair: expect `\uXXXX` low half right after.
                    let mut rest = chars.clone();
                    if rest.next() == Some('\\') && rest.next() == Some('u') {
                        if let Some(low @ 0xDC00..=0xDFFF) = parse_hex4(&mut rest) {
                            let code =
                                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                            if let Some(c) = char::from_u32(code) {
                                out.push(c);
                                chars = rest;
                                continue;
                            }
                        }
                    }
                    out.push('\u{FFFD}');
                }
                Some(code) => out.push(char::from_u32(code).unwrap_or('\u{FFFD}')),
                None => out.push_str("\\u"),
            },
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn trailing_backslashes(s: &str) -> usize {
    s.bytes().rev().take_while(|&b| b == b'\\').count()
}

fn parse_hex4(chars: &mut std::str::Chars<'_>) -> Option<u32> {
    let mut code = 0u32;
    let mut rest = chars.clone();
    for _ in 0..4 {
        code = code * 16 + rest.next()?.to_digit(16)?;
    }
    *chars = rest;
    Some(code)
}
