//! Traffic Pipeline Library
//!
//! The orchestrator of the simulated debugging proxy: persistent rule
//! stores, the scheduler seam for simulated latency, request history, and
//! the staged pipeline that threads every synthetic request through the
//! rule engines and the case backend simulator.

pub mod history;
pub mod pipeline;
pub mod repository;
pub mod scheduler;
pub mod storage;

/// Error types for pipeline operations
pub mod error;

pub use error::{PipelineError, PipelineResult};
pub use history::{CompletedCases, HistoryStore, HISTORY_CAP};
pub use pipeline::{PipelineEvent, TrafficPipeline, BASE_RESPONSE_DELAY_MS};
pub use repository::{
    ConfigRepository, ProxyConfig, RuleRepository, RuleStores, ScriptLogStore, ThrottleState,
    ThrottleStore, SCRIPT_LOG_CAP,
};
pub use scheduler::{Scheduler, TokioScheduler};
pub use storage::{keys, KvStore, MemoryStore, StorageError};
