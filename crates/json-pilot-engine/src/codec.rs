//! Reversible path <-> marker-identifier codec.
//!
//! A structural path is serialized to its canonical JSON array form,
//! then base64url-encoded without padding. The resulting token is safe
//! to embed in CSS-class-like identifier strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use json_pilot_tree::{path_from_json, path_to_json, PathSegment};

use crate::error::DecodeFailure;

/// Identifier prefix for toggle markers.
pub const MARKER_PATH_PREFIX: &str = "json-path-";
/// Identifier prefix for hover-content carriers.
pub const MARKER_TOOLTIP_PREFIX: &str = "tooltip-";

/// Encodes a path into an opaque URL-safe token.
pub fn encode_path(path: &[PathSegment]) -> String {
    let json = path_to_json(path);
    URL_SAFE_NO_PAD.encode(json.to_string())
}

/// Decodes a token produced by [`encode_path`].
pub fn decode_path(token: &str) -> Result<Vec<PathSegment>, DecodeFailure> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| DecodeFailure::BadBase64)?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeFailure::BadUtf8)?;
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|_| DecodeFailure::BadPayload)?;
    path_from_json(&json).ok_or(DecodeFailure::BadPayload)
}

/// Builds the full marker identifier for a path.
pub fn path_identifier(path: &[PathSegment]) -> String {
    format!("{MARKER_PATH_PREFIX}{}", encode_path(path))
}

/// Extracts the path from a marker identifier.
///
/// Returns `None` for identifiers without the marker prefix, and for
/// stale or corrupted tokens. Decode failures are logged and swallowed
/// so that leftover markers from an earlier revision of the document
/// never surface as user-visible errors.
pub fn path_from_identifier(identifier: &str) -> Option<Vec<PathSegment>> {
    let token = identifier.strip_prefix(MARKER_PATH_PREFIX)?;
    match decode_path(token) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::debug!(identifier, %err, "ignoring undecodable marker identifier");
            None
        }
    }
}

/// Encodes arbitrary hover text into a tooltip identifier.
pub fn tooltip_identifier(content: &str) -> String {
    format!("{MARKER_TOOLTIP_PREFIX}{}", URL_SAFE_NO_PAD.encode(content))
}

/// Recovers the hover text from a tooltip identifier.
pub fn tooltip_from_identifier(identifier: &str) -> Option<String> {
    let token = identifier.strip_prefix(MARKER_TOOLTIP_PREFIX)?;
    let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_mixed_path() {
        let path: Vec<PathSegment> = vec!["users".into(), 3usize.into(), "name".into()];
        let token = encode_path(&path);
        assert_eq!(decode_path(&token).unwrap(), path);
    }

    #[test]
    fn test_empty_path_round_trip() {
        let path: Vec<PathSegment> = vec![];
        assert_eq!(decode_path(&encode_path(&path)).unwrap(), path);
    }

    #[test]
    fn test_unicode_key_round_trip() {
        let path: Vec<PathSegment> = vec!["ключ".into(), "日本語".into()];
        assert_eq!(decode_path(&encode_path(&path)).unwrap(), path);
    }

    #[test]
    fn test_token_is_url_safe() {
        let path: Vec<PathSegment> = vec!["a?b&c".into(), 255usize.into()];
        let token = encode_path(&path);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert_eq!(decode_path("!!!"), Err(DecodeFailure::BadBase64));
    }

    #[test]
    fn test_decode_rejects_non_array_payload() {
        let token = URL_SAFE_NO_PAD.encode("{\"a\":1}");
        assert_eq!(decode_path(&token), Err(DecodeFailure::BadPayload));
        let token = URL_SAFE_NO_PAD.encode("[true]");
        assert_eq!(decode_path(&token), Err(DecodeFailure::BadPayload));
    }

    #[test]
    fn test_identifier_round_trip() {
        let path: Vec<PathSegment> = vec!["a".into(), 0usize.into()];
        let id = path_identifier(&path);
        assert!(id.starts_with(MARKER_PATH_PREFIX));
        assert_eq!(path_from_identifier(&id).unwrap(), path);
    }

    #[test]
    fn test_identifier_without_prefix_ignored() {
        assert_eq!(path_from_identifier("random-class"), None);
    }

    #[test]
    fn test_stale_identifier_ignored() {
        assert_eq!(path_from_identifier("json-path-@@@"), None);
    }

    #[test]
    fn test_tooltip_round_trip() {
        let id = tooltip_identifier("click to expand");
        assert!(id.starts_with(MARKER_TOOLTIP_PREFIX));
        assert_eq!(tooltip_from_identifier(&id).unwrap(), "click to expand");
    }
}
