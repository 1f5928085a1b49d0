//! Access control rules: whitelist/blacklist gate with explicit precedence
//!
//! Whitelist rules are evaluated before blacklist rules, and the presence of
//! any enabled whitelist rule switches the store to default-deny: only URLs
//! matching a whitelist pattern pass, and blacklist rules are not consulted
//! at all. Without whitelist rules the store is default-allow and a matching
//! blacklist rule denies. Patterns match case-insensitively.

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessRuleKind {
    Whitelist,
    Blacklist,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub pattern: String,
    pub kind: AccessRuleKind,
}

impl RuleEntry for AccessRule {
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
        require("pattern", &self.pattern)
    }
}

/// Verdict for one URL. `rule` is the blacklist rule that denied, when there
/// is one; a whitelist default-deny carries no rule.
#[derive(Debug, Clone)]
pub struct AccessDecision<'a> {
    pub allowed: bool,
    pub rule: Option<&'a AccessRule>,
}

pub fn check_access<'a>(rules: &'a [AccessRule], url: &str) -> AccessDecision<'a> {
    let enabled: Vec<&'a AccessRule> = rules.iter().filter(|r| r.enabled).collect();

    let whitelists: Vec<&'a AccessRule> = enabled
        .iter()
        .copied()
        .filter(|r| r.kind == AccessRuleKind::Whitelist)
        .collect();
    if !whitelists.is_empty() {
        let hit = whitelists
            .iter()
            .copied()
            .find(|r| matcher::matches_ignore_case(url, &r.pattern));
        return AccessDecision {
            allowed: hit.is_some(),
            rule: hit,
        };
    }

    let denied = enabled
        .iter()
        .copied()
        .filter(|r| r.kind == AccessRuleKind::Blacklist)
        .find(|r| matcher::matches_ignore_case(url, &r.pattern));
    AccessDecision {
        allowed: denied.is_none(),
        rule: denied,
    }
}
