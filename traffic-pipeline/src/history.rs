//! Request history and completed-case persistence
//!
//! History keeps the most recent resolved exchanges, capped, and degrades
//! under storage pressure instead of failing: on a quota error the retained
//! window is halved and the write retried once, then dropped silently.

use crate::storage::{keys, KvStore, StorageError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};
use traffic_core::NetworkRequest;

/// Resolved exchanges retained before the oldest are trimmed
pub const HISTORY_CAP: usize = 500;

pub struct HistoryStore {
    store: Arc<dyn KvStore>,
}

impl HistoryStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> Vec<NetworkRequest> {
        match self.store.get(&keys::request_history()) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Corrupt request history, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    }

    /// Append one resolved exchange, trimming to the cap.
    pub fn record(&self, request: &NetworkRequest) {
        let mut entries = self.all();
        entries.push(request.clone());
        if entries.len() > HISTORY_CAP {
            let excess = entries.len() - HISTORY_CAP;
            entries.drain(..excess);
        }
        self.persist(entries);
    }

    pub fn clear(&self) {
        self.store.remove(&keys::request_history());
    }

    fn persist(&self, mut entries: Vec<NetworkRequest>) {
        match self.write(&entries) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded) => {
                // halve the retained window and retry once
                let keep = entries.len() / 2;
                let start = entries.len() - keep;
                entries.drain(..start);
                if let Err(e) = self.write(&entries) {
                    debug!("Dropping history write after degraded retry: {}", e);
                }
            }
            Err(e) => warn!("Failed to persist request history: {}", e),
        }
    }

    fn write(&self, entries: &[NetworkRequest]) -> Result<(), StorageError> {
        let json = serde_json::to_string(entries)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.store.set(&keys::request_history(), json)
    }
}

/// The set of case studies the player has solved
pub struct CompletedCases {
    store: Arc<dyn KvStore>,
}

impl CompletedCases {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn all(&self) -> BTreeSet<String> {
        match self.store.get(&keys::completed_cases()) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            None => BTreeSet::new(),
        }
    }

    pub fn is_completed(&self, case_id: &str) -> bool {
        self.all().contains(case_id)
    }

    pub fn mark(&self, case_id: &str) {
        let mut cases = self.all();
        if cases.insert(case_id.to_string()) {
            match serde_json::to_string(&cases) {
                Ok(json) => {
                    if let Err(e) = self.store.set(&keys::completed_cases(), json) {
                        warn!("Failed to persist completed cases: {}", e);
                    }
                }
                Err(e) => warn!("Failed to serialize completed cases: {}", e),
            }
        }
    }
}
