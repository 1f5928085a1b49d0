//! Reverse proxy rules: listen-path rewriting onto a target URL

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use serde::{Deserialize, Serialize};

/// Rewrites matching URLs onto `target_url`. With `rewrite_path` set, the
/// listen prefix (the pattern up to its trailing `*`) is stripped and the
/// remainder concatenated onto the target; otherwise the whole URL is
/// replaced by the target as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseProxyRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub listen_path: String,
    pub target_url: String,
    pub rewrite_path: bool,
}

impl RuleEntry for ReverseProxyRule {
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
        require("listen_path", &self.listen_path)?;
        require("target_url", &self.target_url)
    }
}

/// First enabled rule whose listen path matches.
pub fn match_reverse_proxy<'a>(
    rules: &'a [ReverseProxyRule],
    url: &str,
) -> Option<&'a ReverseProxyRule> {
    rules
        .iter()
        .filter(|r| r.enabled)
        .find(|r| matcher::matches(url, &r.listen_path))
}

/// Compute the rewritten URL for a matched rule.
pub fn apply_reverse_proxy(url: &str, rule: &ReverseProxyRule) -> String {
    if rule.rewrite_path {
        if let Some(prefix) = rule.listen_path.strip_suffix('*') {
            if let Some(rest) = url.strip_prefix(prefix) {
                return format!("{}{}", rule.target_url.trim_end_matches('/'), ensure_leading_slash(rest));
            }
        }
    }
    rule.target_url.clone()
}

fn ensure_leading_slash(rest: &str) -> String {
    if rest.is_empty() || rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}
