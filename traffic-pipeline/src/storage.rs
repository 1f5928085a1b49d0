//! Key-value persistence seam
//!
//! Everything the simulator persists goes through [`KvStore`]: JSON strings
//! under flat, prefixed keys, read-modify-write, no schema versioning, last
//! write wins. The browser host backs this with localStorage; tests and the
//! demo binary use the in-memory implementation, whose optional byte quota
//! exists so the degraded-write paths can be exercised.

use dashmap::DashMap;
use thiserror::Error;

/// Key prefix shared by every persisted entry
pub const KEY_PREFIX: &str = "trafficlab";

/// Well-known storage keys
pub mod keys {
    use super::KEY_PREFIX;

    pub fn access_control_rules() -> String {
        format!("{}_access_control_rules", KEY_PREFIX)
    }
    pub fn mirror_rules() -> String {
        format!("{}_mirror_rules", KEY_PREFIX)
    }
    pub fn rewrite_rules() -> String {
        format!("{}_rewrite_rules", KEY_PREFIX)
    }
    pub fn map_local_rules() -> String {
        format!("{}_map_local_rules", KEY_PREFIX)
    }
    pub fn gateway_rules() -> String {
        format!("{}_gateway_rules", KEY_PREFIX)
    }
    pub fn reverse_proxy_rules() -> String {
        format!("{}_reverse_proxy_rules", KEY_PREFIX)
    }
    pub fn breakpoint_rules() -> String {
        format!("{}_breakpoint_rules", KEY_PREFIX)
    }
    pub fn breakpoint_config() -> String {
        format!("{}_breakpoint_config", KEY_PREFIX)
    }
    pub fn script_rules() -> String {
        format!("{}_script_rules", KEY_PREFIX)
    }
    pub fn script_logs() -> String {
        format!("{}_script_logs", KEY_PREFIX)
    }
    pub fn throttle_config() -> String {
        format!("{}_throttle_config", KEY_PREFIX)
    }
    pub fn turbo_mode() -> String {
        format!("{}_turbo_mode", KEY_PREFIX)
    }
    pub fn proxy_config() -> String {
        format!("{}_proxy_config", KEY_PREFIX)
    }
    pub fn request_history() -> String {
        format!("{}_request_history", KEY_PREFIX)
    }
    pub fn completed_cases() -> String {
        format!("{}_completed_cases", KEY_PREFIX)
    }
}

/// Errors a storage backend can report on write
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// The persistence contract. Reads are infallible by design: a backend that
/// cannot produce a value answers `None` and callers fall back to defaults.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str);
}

/// In-memory backend with an optional total-bytes quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once the sum of all values would exceed
    /// `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: DashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.key() != key)
            .map(|e| e.value().len())
            .sum()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            if self.used_excluding(key) + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
