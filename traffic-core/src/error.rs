//! Error types for core operations

use std::fmt;

/// Main error type for core operations
#[derive(Debug, Clone)]
pub enum CoreError {
    /// A rule failed field validation
    Validation(String),
    /// A URL could not be parsed or rewritten
    Url(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Validation(msg) => write!(f, "Validation error: {}", msg),
            CoreError::Url(msg) => write!(f, "URL error: {}", msg),
        }
    }
}

impl std::error::Error for CoreError {}
