//! Traffic Core Library
//!
//! This library provides the core building blocks for the simulated HTTP
//! debugging proxy: the request model, the wildcard pattern matcher, the
//! rule engines applied by the traffic pipeline, the throttle calculator
//! and the script engine.

pub mod matcher;
pub mod model;
pub mod rules;
pub mod script;
pub mod throttle;

/// Error types for core operations
pub mod error;

pub use error::CoreError;
pub use model::{NetworkRequest, ResourceType};
pub use script::{
    ScriptLogEntry, ScriptLogLevel, ScriptOp, ScriptRule, ScriptSide, ScriptTrigger, ScriptValue,
};
pub use throttle::{DelayOutcome, ThrottleProfile};

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
