use thiserror::Error;

/// Reasons a marker token failed to decode back into a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("token is not valid base64")]
    BadBase64,
    #[error("token payload is not valid UTF-8")]
    BadUtf8,
    #[error("token payload is not a path array")]
    BadPayload,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("failed to decode path token: {0}")]
    Decode(#[from] DecodeFailure),
    #[error("document is not parseable JSON")]
    ParseFailure,
    #[error("string content is not an embedded JSON object or array")]
    InvalidEmbeddedJson,
    #[error("{0}")]
    Query(String),
    #[error("editor action {0:?} is not available")]
    ActionUnavailable(String),
}
