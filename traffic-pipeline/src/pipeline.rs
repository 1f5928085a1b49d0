//! The traffic pipeline: ordered rule engines over synthetic requests
//!
//! One request flows through a fixed stage order, each stage a potential
//! exit: mirror, rewrite, request scripts, gateway block, breakpoint pause,
//! the dispatch gate, access control, turbo mode, reverse proxy, the
//! packet-loss draw, backend simulation, map-local override, the throttle
//! delay, response scripts, commit. Short-circuit outcomes are mutually
//! exclusive; at most one fires per request. Resolution happens on spawned
//! tasks behind simulated delays, so records are always replaced by id,
//! never by list position.

use crate::error::{PipelineError, PipelineResult};
use crate::history::{CompletedCases, HistoryStore};
use crate::repository::RuleStores;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::storage::KvStore;
use case_engine::CaseRegistry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use traffic_core::rules::{
    apply_map_local, apply_mirror, apply_reverse_proxy, apply_rewrite, blocking_rule,
    check_access, match_reverse_proxy, should_block_resource, should_pause, BreakpointPhase,
    ResponseOverrides,
};
use traffic_core::script::execute_phase;
use traffic_core::throttle::{self, DelayOutcome};
use traffic_core::{NetworkRequest, ResourceType, ScriptLogEntry, ScriptTrigger};

/// Base delivery delay every simulated response starts from, before the
/// active throttle profile adds its share.
pub const BASE_RESPONSE_DELAY_MS: u64 = 100;

/// Outbound notifications for the embedding UI
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// A request resolved and was replaced in the shared list
    Resolved(NetworkRequest),
    /// The player's action satisfied the active case's win condition
    CaseSolved { case_id: String },
    /// A script rule produced a console line
    ScriptLog(ScriptLogEntry),
}

struct PausedRequest {
    request: NetworkRequest,
    /// Response-side rewrite effects collected before the pause
    overrides: ResponseOverrides,
}

/// The orchestrator. Owns the shared request list, the paused-request
/// table and every rule store; rule reads go through the repositories on
/// each invocation so UI edits apply to the very next request.
pub struct TrafficPipeline {
    stores: RuleStores,
    history: HistoryStore,
    completed: CompletedCases,
    registry: CaseRegistry,
    active_case: RwLock<String>,
    requests: RwLock<Vec<NetworkRequest>>,
    paused: DashMap<String, PausedRequest>,
    scheduler: Arc<dyn Scheduler>,
    events: Option<mpsc::Sender<PipelineEvent>>,
}

impl TrafficPipeline {
    pub fn new(store: Arc<dyn KvStore>, registry: CaseRegistry) -> Self {
        Self {
            stores: RuleStores::new(Arc::clone(&store)),
            history: HistoryStore::new(Arc::clone(&store)),
            completed: CompletedCases::new(store),
            registry,
            active_case: RwLock::new(String::new()),
            requests: RwLock::new(Vec::new()),
            paused: DashMap::new(),
            scheduler: Arc::new(TokioScheduler),
            events: None,
        }
    }

    pub fn with_events(mut self, sender: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// The rule stores, for UI-facing CRUD.
    pub fn stores(&self) -> &RuleStores {
        &self.stores
    }

    pub fn completed_cases(&self) -> &CompletedCases {
        &self.completed
    }

    pub async fn set_active_case(&self, case_id: impl Into<String>) {
        *self.active_case.write().await = case_id.into();
    }

    pub async fn active_case(&self) -> String {
        self.active_case.read().await.clone()
    }

    /// Snapshot of the shared request list, in submission order.
    pub async fn requests(&self) -> Vec<NetworkRequest> {
        self.requests.read().await.clone()
    }

    /// Ids of requests currently held at a breakpoint.
    pub fn paused_ids(&self) -> Vec<String> {
        self.paused.iter().map(|e| e.key().clone()).collect()
    }

    /// Drop the visible list and persisted history. In-flight resolutions
    /// become no-ops against the rebuilt list; that is accepted.
    pub async fn clear_history(&self) {
        self.requests.write().await.clear();
        self.history.clear();
    }

    /// Accept a freshly constructed pending request and run it through the
    /// stages on a background task.
    pub async fn submit(self: &Arc<Self>, request: NetworkRequest) {
        self.requests.write().await.push(request.clone());
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.process(request).await;
        });
    }

    /// Release a request held at a breakpoint, optionally with an edited
    /// body, re-entering the pipeline at the dispatch gate.
    pub async fn resume(self: &Arc<Self>, id: &str, edited_body: Option<String>) -> PipelineResult<()> {
        let (_, paused) = self
            .paused
            .remove(id)
            .ok_or_else(|| PipelineError::RequestNotPaused { id: id.to_string() })?;
        let mut request = paused.request;
        request.is_paused = false;
        if let Some(body) = edited_body {
            request.request_body = Some(body);
        }
        self.replace_in_list(&request).await;
        let pipeline = Arc::clone(self);
        let overrides = paused.overrides;
        tokio::spawn(async move {
            pipeline.continue_from_dispatch(request, overrides).await;
        });
        Ok(())
    }

    /// Discard a request held at a breakpoint. The record disappears from
    /// the list permanently.
    pub async fn drop_request(&self, id: &str) -> PipelineResult<()> {
        self.paused
            .remove(id)
            .ok_or_else(|| PipelineError::RequestNotPaused { id: id.to_string() })?;
        self.requests.write().await.retain(|r| r.id != id);
        Ok(())
    }

    async fn process(self: Arc<Self>, mut request: NetworkRequest) {
        // 1: mirror rewrites the origin, keeping path and query
        if let Some(mirrored) = apply_mirror(&self.stores.mirror.get_active(), &request.url) {
            debug!("Mirrored {} -> {}", request.url, mirrored);
            request.url = mirrored;
        }

        // 2: cumulative rewrites; response-side effects wait for a response
        let overrides = apply_rewrite(&self.stores.rewrite.get_active(), &mut request);

        // 3: request-phase scripts
        self.run_scripts(&mut request, ScriptTrigger::Request).await;

        // 4: gateway verdict ends everything, backend included
        if let Some(rule) = blocking_rule(&self.stores.gateway.get_active(), &request.url) {
            info!("Gateway rule '{}' blocked {}", rule.name, request.url);
            request.status = 403;
            request.status_text = "Blocked by Gateway Rule".to_string();
            request.response_body.clear();
            request.size = 0;
            request.time_ms = 0;
            self.commit(request, None).await;
            return;
        }

        // 5: breakpoint hold
        let bp_config = self.stores.breakpoint_config.load();
        let bp_rules = self.stores.breakpoints.get_active();
        if should_pause(&bp_config, &bp_rules, &request.url, BreakpointPhase::Request) {
            info!("Breakpoint holding {}", request.url);
            request.is_paused = true;
            request.status = 0;
            self.replace_in_list(&request).await;
            self.paused
                .insert(request.id.clone(), PausedRequest { request, overrides });
            return;
        }

        self.continue_from_dispatch(request, overrides).await;
    }

    async fn continue_from_dispatch(
        self: Arc<Self>,
        mut request: NetworkRequest,
        overrides: ResponseOverrides,
    ) {
        // 6: only fetch/xhr/img reach backend simulation
        if !request.resource_type.is_simulated() {
            let (body, content_type) = canned_static_body(request.resource_type);
            request.status = 200;
            request.status_text = "OK".to_string();
            request.set_response_header("Content-Type", content_type);
            request.size = body.len() as u64;
            request.response_body = body;
            request.time_ms = 0;
            self.commit(request, None).await;
            return;
        }

        // 7: access control
        let access_rules = self.stores.access_control.get_active();
        let decision = check_access(&access_rules, &request.url);
        if !decision.allowed {
            let rule_name = decision
                .rule
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "default-deny".to_string());
            info!("Access control denied {} ({})", request.url, rule_name);
            request.status = 403;
            request.status_text = "Forbidden".to_string();
            request.set_response_header("x-blocked-by", "access-control");
            request.set_response_header("x-rule", rule_name.clone());
            let body = serde_json::json!({
                "error": "blocked by access control",
                "rule": rule_name,
                "url": request.url,
            })
            .to_string();
            request.size = body.len() as u64;
            request.response_body = body;
            request.time_ms = 0;
            self.commit(request, None).await;
            return;
        }

        // 8: turbo mode resource blocking
        if should_block_resource(&self.stores.turbo.load(), request.resource_type) {
            request.status = 0;
            request.status_text = "Blocked by Turbo Mode".to_string();
            request.time_ms = 0;
            self.commit(request, None).await;
            return;
        }

        // 9: reverse proxy rewrite
        let rp_rules = self.stores.reverse_proxy.get_active();
        if let Some(rule) = match_reverse_proxy(&rp_rules, &request.url) {
            let original = request.url.clone();
            request.url = apply_reverse_proxy(&original, rule);
            debug!("Reverse proxy '{}': {} -> {}", rule.name, original, request.url);
            request.set_request_header("x-reverse-proxy", rule.name.clone());
            request.set_request_header("x-original-url", original);
        }

        // 10: packet-loss draw, delivered after the profile's latency
        let profile = self.stores.throttle.current();
        if throttle::should_drop_packet(&profile) {
            self.scheduler.delay(profile.latency_ms).await;
            request.status = 0;
            request.status_text = "Packet Lost (Throttle)".to_string();
            request.time_ms = profile.latency_ms;
            self.commit(request, None).await;
            return;
        }

        // 11: backend simulation for the active case
        let case_id = self.active_case().await;
        let outcome = self.registry.simulate(&case_id, &request);
        request.status = outcome.response.status;
        request.status_text = outcome.response.status_text.clone();
        for (key, value) in &outcome.response.headers {
            request.set_response_header(key.clone(), value.clone());
        }
        request.size = outcome.response.body.len() as u64;
        request.response_body = outcome.response.body.clone();

        overrides.apply(&mut request);

        // 12: map-local replaces the body wholesale, status untouched
        let map_rules = self.stores.map_local.get_active();
        if let Some(rule) = apply_map_local(&map_rules, &request.url) {
            debug!("Map-local '{}' overriding body for {}", rule.name, request.url);
            request.set_response_header("Content-Type", rule.content_type.clone());
            request.size = rule.content.len() as u64;
            request.response_body = rule.content.clone();
        }

        // 13: delivery delay from base + size + profile
        match throttle::compute_delay(BASE_RESPONSE_DELAY_MS, request.size, &profile) {
            DelayOutcome::Wait(ms) => {
                self.scheduler.delay(ms).await;
                request.time_ms = outcome.response.time_ms + ms;
            }
            DelayOutcome::Unreachable => {
                // profile drops every packet; deliver the loss verdict
                self.scheduler.delay(profile.latency_ms).await;
                request.status = 0;
                request.status_text = "Packet Lost (Throttle)".to_string();
                request.time_ms = profile.latency_ms;
                self.commit(request, None).await;
                return;
            }
        }

        // 14: response-phase scripts
        self.run_scripts(&mut request, ScriptTrigger::Response).await;

        // 15: commit
        let solved_case = outcome.solved.then_some(case_id);
        self.commit(request, solved_case).await;
    }

    async fn run_scripts(&self, request: &mut NetworkRequest, phase: ScriptTrigger) {
        let rules = self.stores.scripts.get_active();
        for entry in execute_phase(&rules, request, phase) {
            self.stores.script_logs.append(entry.clone());
            self.emit(PipelineEvent::ScriptLog(entry)).await;
        }
    }

    async fn commit(&self, mut request: NetworkRequest, solved_case: Option<String>) {
        request.is_paused = false;
        self.replace_in_list(&request).await;
        self.history.record(&request);
        self.emit(PipelineEvent::Resolved(request)).await;
        if let Some(case_id) = solved_case {
            if !case_id.is_empty() {
                info!("Case '{}' solved", case_id);
                self.completed.mark(&case_id);
                self.emit(PipelineEvent::CaseSolved { case_id }).await;
            }
        }
    }

    async fn replace_in_list(&self, request: &NetworkRequest) {
        let mut list = self.requests.write().await;
        if let Some(slot) = list.iter_mut().find(|r| r.id == request.id) {
            *slot = request.clone();
        }
        // a missing slot means history was cleared mid-flight; the
        // resolution is orphaned and simply not shown
    }

    async fn emit(&self, event: PipelineEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event).await;
        }
    }
}

fn canned_static_body(resource: ResourceType) -> (String, &'static str) {
    match resource {
        ResourceType::Document => (
            "<!doctype html><html><head><title>shop.example</title></head>\
             <body><div id=\"app\"></div></body></html>"
                .to_string(),
            "text/html",
        ),
        ResourceType::Script => ("console.log('telemetry stub');".to_string(), "application/javascript"),
        ResourceType::Stylesheet => (":root { --accent: #4f46e5; }".to_string(), "text/css"),
        ResourceType::Font => (String::new(), "font/woff2"),
        ResourceType::Fetch | ResourceType::Xhr | ResourceType::Image => {
            ("{}".to_string(), "application/json")
        }
    }
}
