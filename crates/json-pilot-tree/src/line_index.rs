//! Offset ↔ line/column conversion.
//!
//! Rendering surfaces address edits in line/column space; the engine works
//! in byte offsets. A [`LineIndex`] is built once per text snapshot and gives
//! a stable mapping both ways. Lines and columns are 0-based; columns are
//! byte columns within the line.

/// Line/column position within a text snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Precomputed table of line-start offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(i + 1),
                b'\r' => {
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                _ => {}
            }
            i += 1;
        }
        Self { line_starts, len: text.len() }
    }

    /// Position of a byte offset. Offsets past the end clamp to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        Position { line, column: offset - self.line_starts[line] }
    }

    /// Byte offset of a position. Out-of-range positions clamp.
    pub fn offset(&self, position: Position) -> usize {
        match self.line_starts.get(position.line) {
            Some(&start) => {
                let line_end = self
                    .line_starts
                    .get(position.line + 1)
                    .copied()
                    .unwrap_or(self.len);
                (start + position.column).min(line_end)
            }
            None => self.len,
        }
    }

    /// Byte offset where the given line starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }
}
