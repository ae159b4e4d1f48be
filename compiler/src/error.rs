use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThriftError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected character {ch:?} at line {line}, column {column}")]
    UnexpectedCharacter {
        ch:     char,
        line:   usize,
        column: usize,
    },

    #[error("Unterminated /* comment */ at line {line}, column {column}")]
    UnterminatedComment { line: usize, column: usize },

    #[error("Invalid integer literal at line {line}, column {column}")]
    InvalidIntegerLiteral { line: usize, column: usize },

    #[error("Bad annotation name at line {line}, column {column}")]
    BadAnnotation { line: usize, column: usize },

    #[error("Parse error at line {line}, column {column}: {msg}")]
    Parse {
        msg:    String,
        line:   usize,
        column: usize,
    },

    #[error("Unsupported feature \"{feature}\" at line {line}, column {column}")]
    Unsupported {
        feature: String,
        line:    usize,
        column:  usize,
    },

    #[error("Unknown type \"{0}\"")]
    UnknownType(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl ThriftError {
    /// Source position as `(row, column)` for errors that carry one, so the
    /// caller can render caret context before reporting the error itself.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ThriftError::UnexpectedCharacter { line, column, .. }
            | ThriftError::UnterminatedComment { line, column }
            | ThriftError::InvalidIntegerLiteral { line, column }
            | ThriftError::BadAnnotation { line, column }
            | ThriftError::Parse { line, column, .. }
            | ThriftError::Unsupported { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}
