//! Rewrite rules: cumulative request/response mutations
//!
//! Unlike the first-match engines, rewrite applies every enabled matching
//! rule in store order; later rules override earlier ones on the same field.
//! Request-side actions mutate the request immediately. Response-side
//! actions target fields that do not exist yet at this stage, so they are
//! collected into [`ResponseOverrides`] and the pipeline replays them once
//! the backend simulation has produced a response.

use super::{require, RuleEntry};
use crate::error::CoreError;
use crate::matcher;
use crate::model::NetworkRequest;
use serde::{Deserialize, Serialize};

/// The single action a rewrite rule performs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RewriteAction {
    /// Replace the request URL wholesale
    Redirect { url: String },
    SetRequestHeader { key: String, value: String },
    SetResponseHeader { key: String, value: String },
    ReplaceResponseBody { body: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub url_pattern: String,
    pub action: RewriteAction,
}

impl RuleEntry for RewriteRule {
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
        match &self.action {
            RewriteAction::Redirect { url } => require("redirect url", url),
            RewriteAction::SetRequestHeader { key, .. }
            | RewriteAction::SetResponseHeader { key, .. } => require("header key", key),
            RewriteAction::ReplaceResponseBody { .. } => Ok(()),
        }
    }
}

/// Response-side effects collected during the request phase, replayed by
/// the pipeline after backend simulation. Later entries override earlier
/// ones, preserving rule order.
#[derive(Debug, Clone, Default)]
pub struct ResponseOverrides {
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl ResponseOverrides {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body.is_none()
    }

    /// Replay the collected effects onto a resolved request record.
    pub fn apply(&self, request: &mut NetworkRequest) {
        for (key, value) in &self.headers {
            request.set_response_header(key.clone(), value.clone());
        }
        if let Some(body) = &self.body {
            request.response_body = body.clone();
            request.size = body.len() as u64;
        }
    }
}

/// Apply all enabled matching rules in order. Rules are matched against the
/// URL as it stands when they are reached, so a redirect changes what later
/// rules see.
pub fn apply_rewrite(rules: &[RewriteRule], request: &mut NetworkRequest) -> ResponseOverrides {
    let mut overrides = ResponseOverrides::default();
    for rule in rules.iter().filter(|r| r.enabled) {
        if !matcher::matches(&request.url, &rule.url_pattern) {
            continue;
        }
        match &rule.action {
            RewriteAction::Redirect { url } => request.url = url.clone(),
            RewriteAction::SetRequestHeader { key, value } => {
                request.set_request_header(key.clone(), value.clone());
            }
            RewriteAction::SetResponseHeader { key, value } => {
                overrides.headers.push((key.clone(), value.clone()));
            }
            RewriteAction::ReplaceResponseBody { body } => {
                overrides.body = Some(body.clone());
            }
        }
    }
    overrides
}
