//! Error types for qtpl.

use thiserror::Error;

/// The main error type for template compilation.
#[derive(Debug, Error)]
pub enum QtplError {
    /// A placeholder carried a type code outside `d`, `f`, `a`, `#`, `s`.
    #[error("Unsupported placeholder type: '?{0}'")]
    UnsupportedPlaceholderType(char),

    /// The escaper was handed something that is not a SQL scalar.
    #[error("Invalid data type for SQL value: {0}")]
    InvalidValueType(&'static str),

    /// An argument's shape does not fit its placeholder.
    #[error("Placeholder '{code}' cannot format a value of kind '{found}'")]
    ShapeMismatch { code: &'static str, found: &'static str },

    /// Strict mode: the argument list ran out before the placeholders did.
    #[error("No argument supplied for placeholder #{position}")]
    MissingArgument { position: usize },

    /// Strict mode: more arguments than placeholders.
    #[error("Template has {expected} placeholder(s) but {supplied} argument(s) were supplied")]
    TooManyArguments { expected: usize, supplied: usize },

    /// Failed to tokenize the template.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed JSON argument input.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QtplError {
    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// Create a shape mismatch error for a placeholder code.
    pub fn shape(code: &'static str, found: &'static str) -> Self {
        Self::ShapeMismatch { code, found }
    }
}

/// Result type alias for qtpl operations.
pub type QtplResult<T> = Result<T, QtplError>;
