//! Wildcard pattern matching shared by every rule engine
//!
//! Patterns expose a single metacharacter to rule authors: `*`, which matches
//! any run of characters. Everything else is taken literally and the whole
//! pattern is anchored, so there are no partial matches. An empty pattern
//! matches only the empty string; that is almost always a configuration
//! mistake, but it is accepted.

use regex::Regex;
use tracing::warn;

/// Check `value` against a wildcard `pattern`, case-sensitively.
pub fn matches(value: &str, pattern: &str) -> bool {
    compile(pattern, false)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

/// Check `value` against a wildcard `pattern`, ignoring case.
/// Used by the access control engine.
pub fn matches_ignore_case(value: &str, pattern: &str) -> bool {
    compile(pattern, true)
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn compile(pattern: &str, case_insensitive: bool) -> Option<Regex> {
    let escaped = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let source = if case_insensitive {
        format!("(?i)^{}$", escaped)
    } else {
        format!("^{}$", escaped)
    };
    match Regex::new(&source) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("Invalid wildcard pattern '{}': {}", pattern, e);
            None
        }
    }
}
