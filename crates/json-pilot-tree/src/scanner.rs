//! Permissive JSON tokenizer.
//!
//! Produces a flat token stream with byte offsets over the raw text. The
//! scanner never fails: bytes it cannot classify become [`TokenKind::Unknown`]
//! tokens, and unterminated strings are still reported as string tokens. This
//! is what lets overlay computation keep working while the user is mid-edit.

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Colon,
    Comma,
    String,
    Number,
    True,
    False,
    Null,
    /// Run of spaces and tabs.
    Whitespace,
    /// Single `\n`, `\r` or `\r\n`.
    LineBreak,
    /// `// ...` up to (not including) the line break.
    LineComment,
    /// `/* ... */`, possibly unterminated.
    BlockComment,
    Unknown,
}

impl TokenKind {
    /// Whitespace and comments carry no semantic value.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineBreak
                | TokenKind::LineComment
                | TokenKind::BlockComment
        )
    }
}

/// A token with its byte range into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub len: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Streaming tokenizer over a text buffer.
pub struct Scanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { bytes: text.as_bytes(), pos: 0 }
    }

    /// Scan the next token. Returns `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        let start = self.pos;
        let b = *self.bytes.get(self.pos)?;

        let kind = match b {
            b'{' => self.single(TokenKind::OpenBrace),
            b'}' => self.single(TokenKind::CloseBrace),
            b'[' => self.single(TokenKind::OpenBracket),
            b']' => self.single(TokenKind::CloseBracket),
            b':' => self.single(TokenKind::Colon),
            b',' => self.single(TokenKind::Comma),
            b' ' | b'\t' => {
                while matches!(self.bytes.get(self.pos), Some(b' ' | b'\t')) {
                    self.pos += 1;
                }
                TokenKind::Whitespace
            }
            b'\n' => self.single(TokenKind::LineBreak),
            b'\r' => {
                self.pos += 1;
                if self.bytes.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                }
                TokenKind::LineBreak
            }
            b'"' => self.scan_string(),
            b'/' => self.scan_comment(),
            b'-' | b'0'..=b'9' => self.scan_number(),
            _ => self.scan_word(),
        };

        Some(Token { kind, offset: start, len: self.pos - start })
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    /// Scan a string token starting at the opening quote. Stops at the
    /// closing quote or at a line break (JSON strings cannot span lines);
    /// either way the token is classified as a string.
    fn scan_string(&mut self) -> TokenKind {
        self.pos += 1;
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    if self.bytes.get(self.pos).is_some() {
                        self.pos += 1;
                    }
                }
                b'\n' | b'\r' => break,
                _ => self.pos += 1,
            }
        }
        TokenKind::String
    }

    fn scan_comment(&mut self) -> TokenKind {
        match self.bytes.get(self.pos + 1) {
            Some(b'/') => {
                self.pos += 2;
                while let Some(&b) = self.bytes.get(self.pos) {
                    if b == b'\n' || b == b'\r' {
                        break;
                    }
                    self.pos += 1;
                }
                TokenKind::LineComment
            }
            Some(b'*') => {
                self.pos += 2;
                while self.pos < self.bytes.len() {
                    if self.bytes[self.pos] == b'*' && self.bytes.get(self.pos + 1) == Some(&b'/') {
                        self.pos += 2;
                        return TokenKind::BlockComment;
                    }
                    self.pos += 1;
                }
                TokenKind::BlockComment
            }
            _ => {
                self.pos += 1;
                TokenKind::Unknown
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        if self.bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        self.digits();
        if self.bytes.get(self.pos) == Some(&b'.') {
            self.pos += 1;
            self.digits();
        }
        if matches!(self.bytes.get(self.pos), Some(b'e' | b'E')) {
            self.pos += 1;
            if matches!(self.bytes.get(self.pos), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            self.digits();
        }
        TokenKind::Number
    }

    fn digits(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    /// Consume an identifier-like run: keywords become their token kinds,
    /// anything else is a single unknown token. Multi-byte UTF-8 sequences
    /// are consumed whole so token boundaries stay on char boundaries.
    fn scan_word(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            self.pos += 1;
            return TokenKind::Unknown;
        }
        match &self.bytes[start..self.pos] {
            b"true" => TokenKind::True,
            b"false" => TokenKind::False,
            b"null" => TokenKind::Null,
            _ => TokenKind::Unknown,
        }
    }
}

/// Tokenize the whole buffer.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(text);
    let mut tokens = Vec::new();
    while let Some(tok) = scanner.next_token() {
        tokens.push(tok);
    }
    tokens
}
