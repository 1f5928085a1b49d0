//! Breakpoint rules: suspend matching requests for manual edit/resume

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use serde::{Deserialize, Serialize};

/// Which lifecycle phase a breakpoint rule arms on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BreakpointPhase {
    Request,
    Response,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakpointRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub url_pattern: String,
    pub phase: BreakpointPhase,
}

impl RuleEntry for BreakpointRule {
    fn id(&self) -> &str {
        &self.id
    }
    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn validate(&self) -> Result<(), CoreError> {
        require("name", &self.name)?;
        require("url_pattern", &self.url_pattern)
    }
}

/// Store-wide toggles alongside the rule list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakpointConfig {
    /// Pause every request regardless of the rule list
    pub pause_all: bool,
}

/// Whether a request at `url` should be held in `phase`.
pub fn should_pause(
    config: &BreakpointConfig,
    rules: &[BreakpointRule],
    url: &str,
    phase: BreakpointPhase,
) -> bool {
    if config.pause_all {
        return true;
    }
    rules.iter().filter(|r| r.enabled).any(|r| {
        (r.phase == phase || r.phase == BreakpointPhase::Both)
            && matcher::matches(url, &r.url_pattern)
    })
}
