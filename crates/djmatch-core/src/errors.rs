//! Error types for djmatch.

use thiserror::Error;

/// Unified error type for all djmatch operations.
#[derive(Error, Debug)]
pub enum DjMatchError {
    /// Configuration validation errors (unknown algorithm, out-of-range
    /// parameter)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input parsing errors (malformed graph file)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Consistency violations detected by the sanity checker
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (graph file, output file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors (fallback)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DjMatchError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        DjMatchError::Config(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        DjMatchError::Parse(message.into())
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        DjMatchError::Validation(message.into())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        DjMatchError::Internal(message.into())
    }
}

/// Result type alias for djmatch operations.
pub type Result<T> = std::result::Result<T, DjMatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let config_err = DjMatchError::config("b must be positive");
        assert!(matches!(config_err, DjMatchError::Config(_)));

        let parse_err = DjMatchError::parse("bad edge line");
        assert!(matches!(parse_err, DjMatchError::Parse(_)));

        let validation_err = DjMatchError::validation("weight mismatch");
        assert!(matches!(validation_err, DjMatchError::Validation(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DjMatchError = io.into();
        assert!(matches!(err, DjMatchError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }
}
