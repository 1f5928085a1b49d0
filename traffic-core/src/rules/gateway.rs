//! Gateway rules: hard-block matching traffic before it reaches anything

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use serde::{Deserialize, Serialize};

/// Any enabled rule matching a request's URL short-circuits the whole
/// pipeline with a synthetic 403; no later stage runs, including backend
/// simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub url_pattern: String,
}

impl RuleEntry for GatewayRule {
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

/// The first enabled rule that blocks this URL, if any.
pub fn blocking_rule<'a>(rules: &'a [GatewayRule], url: &str) -> Option<&'a GatewayRule> {
    rules
        .iter()
        .filter(|r| r.enabled)
        .find(|r| matcher::matches(url, &r.url_pattern))
}

pub fn should_block(rules: &[GatewayRule], url: &str) -> bool {
    blocking_rule(rules, url).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> GatewayRule {
        GatewayRule {
            id: "g".to_string(),
            name: "block ads".to_string(),
            enabled: true,
            url_pattern: pattern.to_string(),
        }
    }

    #[test]
    fn test_matching_rule_blocks() {
        let rules = vec![rule("https://ads.example/*")];
        assert!(should_block(&rules, "https://ads.example/banner.js"));
        assert!(!should_block(&rules, "https://shop.example/api"));
    }

    #[test]
    fn test_disabled_rule_does_not_block() {
        let mut r = rule("*");
        r.enabled = false;
        assert!(!should_block(&[r], "https://anything.example/"));
    }

    #[test]
    fn test_blocking_rule_is_reported() {
        let rules = vec![rule("https://ads.example/*")];
        let hit = blocking_rule(&rules, "https://ads.example/b").unwrap();
        assert_eq!(hit.name, "block ads");
    }
}
