//! Bootstrap expansion error types

use thiserror::Error;

/// Errors from expanding the embedded bootstrap template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("undefined key '{key}' at line {line}")]
    UndefinedKey { key: String, line: usize },

    #[error("malformed syntax at line {line}: {message}")]
    MalformedSyntax { message: String, line: usize },

    #[error("array '{key}' used outside of an each block")]
    ArrayOutsideEach { key: String },

    #[error("table '{key}' cannot be used directly in a placeholder")]
    TableInPlaceholder { key: String },
}
