//! Registry mapping case ids to their backend simulation handlers

use crate::case::{CaseStudy, SimulatedOutcome, SimulatedResponse};
use crate::cases;
use std::collections::HashMap;
use tracing::debug;
use traffic_core::NetworkRequest;

/// A case's backend logic: pure in spirit, boxed so tests can register
/// closures (spies, counters) alongside the built-in handlers.
pub type CaseHandler = Box<dyn Fn(&NetworkRequest) -> SimulatedOutcome + Send + Sync>;

/// Case-id-keyed handler table consulted by the pipeline for every
/// simulated request.
pub struct CaseRegistry {
    handlers: HashMap<String, CaseHandler>,
    catalog: Vec<CaseStudy>,
}

impl CaseRegistry {
    /// An empty registry; unknown case ids fall back to an echo response.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            catalog: Vec::new(),
        }
    }

    /// The registry with every built-in case study installed.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.install(
            cases::price_tampering::case_study(),
            Box::new(cases::price_tampering::handle),
        );
        registry.install(
            cases::idor_orders::case_study(),
            Box::new(cases::idor_orders::handle),
        );
        registry.install(
            cases::auth_bypass::case_study(),
            Box::new(cases::auth_bypass::handle),
        );
        registry
    }

    /// Register a handler together with its catalog entry.
    pub fn install(&mut self, case: CaseStudy, handler: CaseHandler) {
        self.handlers.insert(case.id.clone(), handler);
        self.catalog.push(case);
    }

    /// Register a bare handler (tests, spies). No catalog entry is added.
    pub fn register(&mut self, case_id: impl Into<String>, handler: CaseHandler) {
        self.handlers.insert(case_id.into(), handler);
    }

    pub fn contains(&self, case_id: &str) -> bool {
        self.handlers.contains_key(case_id)
    }

    /// All built-in case studies, in installation order.
    pub fn catalog(&self) -> &[CaseStudy] {
        &self.catalog
    }

    /// Run the backend simulation for `case_id` against `request`.
    pub fn simulate(&self, case_id: &str, request: &NetworkRequest) -> SimulatedOutcome {
        match self.handlers.get(case_id) {
            Some(handler) => handler(request),
            None => {
                debug!("No case handler for '{}', echoing", case_id);
                SimulatedOutcome::plain(echo(request))
            }
        }
    }
}

impl Default for CaseRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn echo(request: &NetworkRequest) -> SimulatedResponse {
    SimulatedResponse::ok(
        serde_json::json!({
            "method": request.method,
            "url": request.url,
        })
        .to_string(),
    )
}
