use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number literal")]
    InvalidNumber,

    #[error("unclosed string literal")]
    UnclosedString,

    #[error("{0} is not defined")]
    UnknownIdentifier(String),

    #[error("{0} is not a function")]
    NotCallable(String),

    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    #[error("{0}")]
    ArityError(String),

    #[error("expression nesting too deep")]
    RecursionLimit,
}
