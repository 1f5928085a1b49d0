//! Map-Local rules: substitute a canned body for the simulated response

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use serde::{Deserialize, Serialize};

/// Replaces the eventual response body and content-type wholesale. Applied
/// after backend simulation: it overrides the computed response, it does not
/// prevent the computation (or its side effects) from happening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapLocalRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub url_pattern: String,
    pub content: String,
    pub content_type: String,
}

impl RuleEntry for MapLocalRule {
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
        require("url_pattern", &self.url_pattern)?;
        require("content_type", &self.content_type)
    }
}

/// First enabled match wins.
pub fn apply_map_local<'a>(rules: &'a [MapLocalRule], url: &str) -> Option<&'a MapLocalRule> {
    rules
        .iter()
        .filter(|r| r.enabled)
        .find(|r| matcher::matches(url, &r.url_pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, content: &str) -> MapLocalRule {
        MapLocalRule {
            id: "ml".to_string(),
            name: "map".to_string(),
            enabled: true,
            url_pattern: pattern.to_string(),
            content: content.to_string(),
            content_type: "application/json".to_string(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            rule("https://shop.example/api/*", "first"),
            rule("https://shop.example/*", "second"),
        ];
        let hit = apply_map_local(&rules, "https://shop.example/api/items").unwrap();
        assert_eq!(hit.content, "first");
    }

    #[test]
    fn test_disabled_rule_falls_through() {
        let mut first = rule("https://shop.example/*", "first");
        first.enabled = false;
        let second = rule("https://shop.example/*", "second");
        let rules = [first, second];
        let hit = apply_map_local(&rules, "https://shop.example/x").unwrap();
        assert_eq!(hit.content, "second");
    }

    #[test]
    fn test_no_match() {
        let rules = vec![rule("https://shop.example/*", "body")];
        assert!(apply_map_local(&rules, "https://other.example/").is_none());
    }
}
