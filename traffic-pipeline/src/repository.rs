//! Persistent stores feeding the pipeline
//!
//! One [`RuleRepository`] per rule engine plus config repositories for the
//! singleton settings. Repositories own their storage key exclusively: they
//! are the only writers, so the in-memory cache they refresh on every save
//! keeps reads as fresh as rereading storage would, and a UI edit is visible
//! to the very next request. Loading never fails; missing or corrupt JSON
//! yields the default with a warning.

use crate::error::{PipelineError, PipelineResult};
use crate::storage::{keys, KvStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::warn;
use traffic_core::rules::{
    AccessRule, BreakpointConfig, BreakpointRule, GatewayRule, MapLocalRule, MirrorRule,
    ReverseProxyRule, RewriteRule, RuleEntry, TurboConfig,
};
use traffic_core::throttle::{self, ThrottleProfile};
use traffic_core::{ScriptLogEntry, ScriptRule};
use uuid::Uuid;

/// Script log entries kept before the oldest are evicted
pub const SCRIPT_LOG_CAP: usize = 1000;

/// CRUD store for one rule engine's list
pub struct RuleRepository<R> {
    store: Arc<dyn KvStore>,
    key: String,
    cache: RwLock<Option<Vec<R>>>,
}

impl<R> RuleRepository<R>
where
    R: RuleEntry + Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KvStore>, key: String) -> Self {
        Self {
            store,
            key,
            cache: RwLock::new(None),
        }
    }

    /// The full rule list, in insertion order. Never fails.
    pub fn load(&self) -> Vec<R> {
        if let Ok(cache) = self.cache.read() {
            if let Some(rules) = cache.as_ref() {
                return rules.clone();
            }
        }
        let rules = match self.store.get(&self.key) {
            Some(raw) => match serde_json::from_str::<Vec<R>>(&raw) {
                Ok(rules) => rules,
                Err(e) => {
                    warn!("Corrupt rule list under '{}', starting empty: {}", self.key, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(rules.clone());
        }
        rules
    }

    /// Persist the list. Best-effort: storage failures are logged, the
    /// cache still reflects the new list.
    pub fn save(&self, rules: &[R]) {
        match serde_json::to_string(rules) {
            Ok(json) => {
                if let Err(e) = self.store.set(&self.key, json) {
                    warn!("Failed to persist '{}': {}", self.key, e);
                }
            }
            Err(e) => warn!("Failed to serialize '{}': {}", self.key, e),
        }
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(rules.to_vec());
        }
    }

    /// Enabled rules only, order preserved.
    pub fn get_active(&self) -> Vec<R> {
        self.load().into_iter().filter(|r| r.is_enabled()).collect()
    }

    /// Validate, assign a fresh id, append and persist.
    pub fn add(&self, mut rule: R) -> PipelineResult<R> {
        rule.validate()?;
        rule.assign_id(Uuid::new_v4().to_string());
        let mut rules = self.load();
        rules.push(rule.clone());
        self.save(&rules);
        Ok(rule)
    }

    /// Replace the rule with the same id.
    pub fn update(&self, rule: R) -> PipelineResult<()> {
        rule.validate()?;
        let mut rules = self.load();
        let slot = rules
            .iter_mut()
            .find(|r| r.id() == rule.id())
            .ok_or_else(|| PipelineError::RuleNotFound {
                id: rule.id().to_string(),
            })?;
        *slot = rule;
        self.save(&rules);
        Ok(())
    }

    pub fn remove(&self, id: &str) -> PipelineResult<()> {
        let mut rules = self.load();
        let before = rules.len();
        rules.retain(|r| r.id() != id);
        if rules.len() == before {
            return Err(PipelineError::RuleNotFound { id: id.to_string() });
        }
        self.save(&rules);
        Ok(())
    }
}

/// Store for a singleton config value
pub struct ConfigRepository<T> {
    store: Arc<dyn KvStore>,
    key: String,
    cache: RwLock<Option<T>>,
}

impl<T> ConfigRepository<T>
where
    T: Serialize + DeserializeOwned + Default + Clone,
{
    pub fn new(store: Arc<dyn KvStore>, key: String) -> Self {
        Self {
            store,
            key,
            cache: RwLock::new(None),
        }
    }

    pub fn load(&self) -> T {
        if let Ok(cache) = self.cache.read() {
            if let Some(value) = cache.as_ref() {
                return value.clone();
            }
        }
        let value = match self.store.get(&self.key) {
            Some(raw) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Corrupt config under '{}', using default: {}", self.key, e);
                    T::default()
                }
            },
            None => T::default(),
        };
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(value.clone());
        }
        value
    }

    pub fn save(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => {
                if let Err(e) = self.store.set(&self.key, json) {
                    warn!("Failed to persist '{}': {}", self.key, e);
                }
            }
            Err(e) => warn!("Failed to serialize '{}': {}", self.key, e),
        }
        if let Ok(mut cache) = self.cache.write() {
            *cache = Some(value.clone());
        }
    }
}

/// Persisted throttle selection: the current profile plus the single
/// user-authored custom slot. Presets are reference data, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThrottleState {
    pub current: ThrottleProfile,
    pub custom: Option<ThrottleProfile>,
}

/// Store wrapper around [`ThrottleState`]
pub struct ThrottleStore {
    config: ConfigRepository<ThrottleState>,
}

impl ThrottleStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            config: ConfigRepository::new(store, keys::throttle_config()),
        }
    }

    pub fn current(&self) -> ThrottleProfile {
        self.config.load().current
    }

    /// Select one of the presets or the custom slot as the active profile.
    pub fn select(&self, profile: ThrottleProfile) {
        let mut state = self.config.load();
        state.current = profile;
        self.config.save(&state);
    }

    /// Overwrite the custom slot and select it.
    pub fn save_custom(&self, mut profile: ThrottleProfile) {
        profile.name = "Custom".to_string();
        let mut state = self.config.load();
        state.custom = Some(profile.clone());
        state.current = profile;
        self.config.save(&state);
    }

    pub fn custom(&self) -> Option<ThrottleProfile> {
        self.config.load().custom
    }

    pub fn presets(&self) -> Vec<ThrottleProfile> {
        throttle::presets()
    }
}

/// Simulated proxy settings surfaced by the settings panel. The pipeline
/// never consults these; they only round-trip for the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub listen_host: String,
    pub listen_port: u16,
    pub record_traffic: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_host: "127.0.0.1".to_string(),
            listen_port: 9090,
            record_traffic: true,
        }
    }
}

/// Append-only script console, capped at [`SCRIPT_LOG_CAP`] entries with the
/// oldest evicted first.
pub struct ScriptLogStore {
    config: ConfigRepository<Vec<ScriptLogEntry>>,
}

impl ScriptLogStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            config: ConfigRepository::new(store, keys::script_logs()),
        }
    }

    pub fn append(&self, entry: ScriptLogEntry) {
        let mut entries = self.config.load();
        entries.push(entry);
        if entries.len() > SCRIPT_LOG_CAP {
            let excess = entries.len() - SCRIPT_LOG_CAP;
            entries.drain(..excess);
        }
        self.config.save(&entries);
    }

    pub fn entries(&self) -> Vec<ScriptLogEntry> {
        self.config.load()
    }

    pub fn clear(&self) {
        self.config.save(&Vec::new());
    }
}

/// Every repository the pipeline reads, constructed over one shared backend.
pub struct RuleStores {
    pub mirror: RuleRepository<MirrorRule>,
    pub rewrite: RuleRepository<RewriteRule>,
    pub map_local: RuleRepository<MapLocalRule>,
    pub gateway: RuleRepository<GatewayRule>,
    pub access_control: RuleRepository<AccessRule>,
    pub reverse_proxy: RuleRepository<ReverseProxyRule>,
    pub breakpoints: RuleRepository<BreakpointRule>,
    pub breakpoint_config: ConfigRepository<BreakpointConfig>,
    pub scripts: RuleRepository<ScriptRule>,
    pub throttle: ThrottleStore,
    pub turbo: ConfigRepository<TurboConfig>,
    pub proxy: ConfigRepository<ProxyConfig>,
    pub script_logs: ScriptLogStore,
}

impl RuleStores {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            mirror: RuleRepository::new(Arc::clone(&store), keys::mirror_rules()),
            rewrite: RuleRepository::new(Arc::clone(&store), keys::rewrite_rules()),
            map_local: RuleRepository::new(Arc::clone(&store), keys::map_local_rules()),
            gateway: RuleRepository::new(Arc::clone(&store), keys::gateway_rules()),
            access_control: RuleRepository::new(Arc::clone(&store), keys::access_control_rules()),
            reverse_proxy: RuleRepository::new(Arc::clone(&store), keys::reverse_proxy_rules()),
            breakpoints: RuleRepository::new(Arc::clone(&store), keys::breakpoint_rules()),
            breakpoint_config: ConfigRepository::new(Arc::clone(&store), keys::breakpoint_config()),
            scripts: RuleRepository::new(Arc::clone(&store), keys::script_rules()),
            throttle: ThrottleStore::new(Arc::clone(&store)),
            turbo: ConfigRepository::new(Arc::clone(&store), keys::turbo_mode()),
            proxy: ConfigRepository::new(Arc::clone(&store), keys::proxy_config()),
            script_logs: ScriptLogStore::new(store),
        }
    }
}
