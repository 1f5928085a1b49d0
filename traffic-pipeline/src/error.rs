//! Pipeline Error Types

use thiserror::Error;
use traffic_core::CoreError;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No request with id {id}")]
    RequestNotFound { id: String },

    #[error("Request {id} is not paused at a breakpoint")]
    RequestNotPaused { id: String },

    #[error("No rule with id {id}")]
    RuleNotFound { id: String },

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] CoreError),
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
