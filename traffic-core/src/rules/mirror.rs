//! Mirror rules: redirect a request's host to a different origin

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Redirects matching traffic to another origin while preserving the
/// path, query and fragment of the original URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    /// Wildcard pattern matched against the full request URL
    pub source_pattern: String,
    /// Replacement origin, e.g. `https://test.shop.example:8443`
    pub target_origin: String,
}

impl RuleEntry for MirrorRule {
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
        require("source_pattern", &self.source_pattern)?;
        Url::parse(&self.target_origin)
            .map_err(|e| CoreError::Url(format!("target origin '{}': {}", self.target_origin, e)))?;
        Ok(())
    }
}

/// First enabled rule whose pattern matches wins. Returns the mirrored URL,
/// or `None` when no rule applies or the rewrite is not representable.
pub fn apply_mirror(rules: &[MirrorRule], url: &str) -> Option<String> {
    let rule = rules
        .iter()
        .filter(|r| r.enabled)
        .find(|r| matcher::matches(url, &r.source_pattern))?;
    rewrite_origin(url, &rule.target_origin).or_else(|| {
        warn!(
            "Mirror rule '{}' could not rewrite '{}' to origin '{}'",
            rule.name, url, rule.target_origin
        );
        None
    })
}

fn rewrite_origin(original: &str, target_origin: &str) -> Option<String> {
    let mut parsed = Url::parse(original).ok()?;
    let target = Url::parse(target_origin).ok()?;
    parsed.set_scheme(target.scheme()).ok()?;
    parsed.set_host(target.host_str()).ok()?;
    parsed.set_port(target.port()).ok()?;
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str, target: &str) -> MirrorRule {
        MirrorRule {
            id: "m1".to_string(),
            name: "mirror".to_string(),
            enabled: true,
            source_pattern: pattern.to_string(),
            target_origin: target.to_string(),
        }
    }

    #[test]
    fn test_mirror_preserves_path_and_query() {
        let rules = vec![rule("https://prod.shop.example/*", "https://test.shop.example")];
        let out = apply_mirror(&rules, "https://prod.shop.example/api/x?q=1#frag");
        assert_eq!(
            out.as_deref(),
            Some("https://test.shop.example/api/x?q=1#frag")
        );
    }

    #[test]
    fn test_mirror_carries_explicit_port() {
        let rules = vec![rule("https://prod.shop.example/*", "http://localhost:8080")];
        let out = apply_mirror(&rules, "https://prod.shop.example/api");
        assert_eq!(out.as_deref(), Some("http://localhost:8080/api"));
    }

    #[test]
    fn test_first_enabled_match_wins() {
        let mut first = rule("https://prod.shop.example/*", "https://a.example");
        first.enabled = false;
        let second = rule("https://prod.shop.example/*", "https://b.example");
        let third = rule("*", "https://c.example");
        let out = apply_mirror(
            &[first, second, third],
            "https://prod.shop.example/api",
        );
        assert_eq!(out.as_deref(), Some("https://b.example/api"));
    }

    #[test]
    fn test_no_match_returns_none() {
        let rules = vec![rule("https://prod.shop.example/*", "https://test.shop.example")];
        assert!(apply_mirror(&rules, "https://other.example/api").is_none());
    }

    #[test]
    fn test_validate_rejects_unparseable_origin() {
        let bad = rule("https://prod.shop.example/*", "not a url");
        assert!(bad.validate().is_err());
        let ok = rule("https://prod.shop.example/*", "https://test.shop.example");
        assert!(ok.validate().is_ok());
    }
}
