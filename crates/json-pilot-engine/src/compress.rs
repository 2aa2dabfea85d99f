//! Trivia compression.
//!
//! Strips every trivia token (whitespace, line breaks, line and block
//! comments) from a document while leaving significant tokens byte for
//! byte intact, string contents included. Works on any scannable text,
//! valid JSON or not.

use json_pilot_tree::tokenize;

/// Removes all trivia from `text`.
pub fn compress(text: &str) -> String {
    let trivia: Vec<(usize, usize)> = tokenize(text)
        .into_iter()
        .filter(|t| t.kind.is_trivia())
        .map(|t| (t.offset, t.end()))
        .collect();
    let mut out = text.to_owned();
    // Back to front so earlier offsets stay valid.
    for &(start, end) in trivia.iter().rev() {
        out.replace_range(start..end, "");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_whitespace_and_newlines() {
        let text = "{\n  \"a\": [1, 2],\n  \"b\": true\n}";
        assert_eq!(compress(text), "{\"a\":[1,2],\"b\":true}");
    }

    #[test]
    fn test_strips_comments() {
        let text = "{\n  // count\n  \"a\": 1, /* inline */ \"b\": 2\n}";
        assert_eq!(compress(text), "{\"a\":1,\"b\":2}");
    }

    #[test]
    fn test_string_contents_untouched() {
        let text = "{ \"msg\": \"a  b // not a comment\" }";
        assert_eq!(compress(text), "{\"msg\":\"a  b // not a comment\"}");
    }

    #[test]
    fn test_idempotent() {
        let text = "{\n  \"a\": 1 // x\n}";
        let once = compress(text);
        assert_eq!(compress(&once), once);
    }

    #[test]
    fn test_invalid_json_still_compressed() {
        assert_eq!(compress("{ \"a\": \n }"), "{\"a\":}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compress(""), "");
    }
}
