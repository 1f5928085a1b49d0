//! Rule engines applied by the traffic pipeline
//!
//! Each engine is a small, independent module: a rule struct with the shared
//! id/name/enabled shape, and a pure apply function the pipeline calls with
//! the currently active (enabled) rules. Evaluation order within a store is
//! insertion order; the access control engine documents its own precedence.

pub mod access_control;
pub mod breakpoint;
pub mod gateway;
pub mod map_local;
pub mod mirror;
pub mod reverse_proxy;
pub mod rewrite;
pub mod turbo;

pub use access_control::{check_access, AccessDecision, AccessRule, AccessRuleKind};
pub use breakpoint::{should_pause, BreakpointConfig, BreakpointPhase, BreakpointRule};
pub use gateway::{blocking_rule, should_block, GatewayRule};
pub use map_local::{apply_map_local, MapLocalRule};
pub use mirror::{apply_mirror, MirrorRule};
pub use reverse_proxy::{apply_reverse_proxy, match_reverse_proxy, ReverseProxyRule};
pub use rewrite::{apply_rewrite, ResponseOverrides, RewriteAction, RewriteRule};
pub use turbo::{should_block_resource, TurboConfig};

use crate::error::CoreError;

/// Common surface every stored rule exposes to the repositories.
///
/// Stores never reorder rules and the pipeline never mutates them; this
/// trait only carries what CRUD needs.
pub trait RuleEntry: Clone {
    fn id(&self) -> &str;
    fn assign_id(&mut self, id: String);
    fn is_enabled(&self) -> bool;
    /// Reject rules missing required fields. Called on add/update only;
    /// loading never validates, it trusts what was saved.
    fn validate(&self) -> Result<(), CoreError>;
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}
