//! Script engine: a small data DSL run against matching requests
//!
//! Scripts are not evaluated source text. A rule carries a list of tagged
//! operations (set a header, set the body, set the status, log a message)
//! whose values can be literals or reads from the request itself. The
//! interpreter runs each matching rule once per phase; a failing operation
//! produces an error-level log entry, skips the rest of that rule, keeps
//! every mutation made so far, and never aborts the pipeline.

use crate::matcher;
use crate::model::NetworkRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// When a script rule fires relative to the request lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptTrigger {
    Request,
    Response,
    /// Runs in both phases. For header/body operations without an explicit
    /// side, `Both` addresses the request side in either phase; that is the
    /// historical behavior rules may depend on.
    Both,
}

/// Which side of the exchange an operation addresses
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptSide {
    Request,
    Response,
}

/// Severity of a captured script log line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLogLevel {
    Log,
    Info,
    Warn,
    Error,
}

impl fmt::Display for ScriptLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScriptLogLevel::Log => "log",
            ScriptLogLevel::Info => "info",
            ScriptLogLevel::Warn => "warn",
            ScriptLogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// A value source for script operations. Reads are routed to the same side
/// the operation writes to unless the source names its own side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum ScriptValue {
    /// A fixed string
    Literal { text: String },
    /// The current value of a header; fails if the header is absent
    Header {
        #[serde(default)]
        side: Option<ScriptSide>,
        key: String,
    },
    /// The whole body; fails if there is no body on that side
    Body {
        #[serde(default)]
        side: Option<ScriptSide>,
    },
    /// A JSON pointer into the body; fails on non-JSON bodies and
    /// dangling pointers
    BodyJson {
        #[serde(default)]
        side: Option<ScriptSide>,
        pointer: String,
    },
}

/// One interpreted operation of a script rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    SetHeader {
        #[serde(default)]
        side: Option<ScriptSide>,
        key: String,
        value: ScriptValue,
    },
    SetBody {
        #[serde(default)]
        side: Option<ScriptSide>,
        content: ScriptValue,
    },
    SetStatus {
        code: u16,
        #[serde(default)]
        text: Option<String>,
    },
    Log {
        level: ScriptLogLevel,
        message: ScriptValue,
    },
}

/// A script rule: pattern-matched, enable/disable-able, phase-triggered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptRule {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub url_pattern: String,
    pub trigger: ScriptTrigger,
    pub ops: Vec<ScriptOp>,
}

impl crate::rules::RuleEntry for ScriptRule {
    fn id(&self) -> &str {
        &self.id
    }
    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
    fn is_enabled(&self) -> bool {
        self.enabled
    }
    fn validate(&self) -> Result<(), crate::error::CoreError> {
        crate::rules::require("name", &self.name)?;
        crate::rules::require("url_pattern", &self.url_pattern)
    }
}

/// A captured console line from a script run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptLogEntry {
    pub timestamp: DateTime<Utc>,
    pub rule_id: String,
    pub rule_name: String,
    pub level: ScriptLogLevel,
    pub message: String,
}

impl ScriptLogEntry {
    fn new(rule: &ScriptRule, level: ScriptLogLevel, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            level,
            message,
        }
    }
}

/// Run every enabled rule matching `request.url` whose trigger covers
/// `phase`. Returns the log entries produced; mutations land directly on
/// the request.
pub fn execute_phase(
    rules: &[ScriptRule],
    request: &mut NetworkRequest,
    phase: ScriptTrigger,
) -> Vec<ScriptLogEntry> {
    let mut logs = Vec::new();
    for rule in rules {
        if !rule.enabled || !trigger_covers(rule.trigger, phase) {
            continue;
        }
        if !matcher::matches(&request.url, &rule.url_pattern) {
            continue;
        }
        for op in &rule.ops {
            match run_op(op, rule, request, &mut logs) {
                Ok(()) => {}
                Err(msg) => {
                    logs.push(ScriptLogEntry::new(rule, ScriptLogLevel::Error, msg));
                    break;
                }
            }
        }
    }
    logs
}

fn trigger_covers(trigger: ScriptTrigger, phase: ScriptTrigger) -> bool {
    trigger == phase || trigger == ScriptTrigger::Both
}

fn run_op(
    op: &ScriptOp,
    rule: &ScriptRule,
    request: &mut NetworkRequest,
    logs: &mut Vec<ScriptLogEntry>,
) -> Result<(), String> {
    let default_side = match rule.trigger {
        ScriptTrigger::Response => ScriptSide::Response,
        ScriptTrigger::Request | ScriptTrigger::Both => ScriptSide::Request,
    };
    match op {
        ScriptOp::SetHeader { side, key, value } => {
            let side = side.unwrap_or(default_side);
            let resolved = resolve(value, request, side)?;
            match side {
                ScriptSide::Request => request.set_request_header(key.clone(), resolved),
                ScriptSide::Response => request.set_response_header(key.clone(), resolved),
            }
            Ok(())
        }
        ScriptOp::SetBody { side, content } => {
            let side = side.unwrap_or(default_side);
            let resolved = resolve(content, request, side)?;
            match side {
                ScriptSide::Request => request.request_body = Some(resolved),
                ScriptSide::Response => {
                    request.size = resolved.len() as u64;
                    request.response_body = resolved;
                }
            }
            Ok(())
        }
        ScriptOp::SetStatus { code, text } => {
            if !(100..=599).contains(code) {
                return Err(format!("status code {} out of range", code));
            }
            request.status = *code;
            if let Some(text) = text {
                request.status_text = text.clone();
            }
            Ok(())
        }
        ScriptOp::Log { level, message } => {
            let resolved = resolve(message, request, default_side)?;
            logs.push(ScriptLogEntry::new(rule, *level, resolved));
            Ok(())
        }
    }
}

fn resolve(
    value: &ScriptValue,
    request: &NetworkRequest,
    op_side: ScriptSide,
) -> Result<String, String> {
    match value {
        ScriptValue::Literal { text } => Ok(text.clone()),
        ScriptValue::Header { side, key } => {
            let side = side.unwrap_or(op_side);
            let found = match side {
                ScriptSide::Request => request.request_header(key),
                ScriptSide::Response => request.response_header(key),
            };
            found
                .map(str::to_string)
                .ok_or_else(|| format!("header '{}' not present", key))
        }
        ScriptValue::Body { side } => match side.unwrap_or(op_side) {
            ScriptSide::Request => request
                .request_body
                .clone()
                .ok_or_else(|| "request has no body".to_string()),
            ScriptSide::Response => Ok(request.response_body.clone()),
        },
        ScriptValue::BodyJson { side, pointer } => {
            let body = match side.unwrap_or(op_side) {
                ScriptSide::Request => request
                    .request_body
                    .as_deref()
                    .ok_or_else(|| "request has no body".to_string())?,
                ScriptSide::Response => request.response_body.as_str(),
            };
            let parsed: serde_json::Value = serde_json::from_str(body)
                .map_err(|e| format!("body is not valid JSON: {}", e))?;
            let found = parsed
                .pointer(pointer)
                .ok_or_else(|| format!("no value at JSON pointer '{}'", pointer))?;
            Ok(match found {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
        }
    }
}
