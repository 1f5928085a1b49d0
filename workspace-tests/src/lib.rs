//! Workspace integration tests
//!
//! Shared helpers for driving a full pipeline against the in-memory store.
//! The scenarios themselves live under `tests/`.

use case_engine::CaseRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use traffic_core::NetworkRequest;
use traffic_pipeline::{MemoryStore, PipelineEvent, TrafficPipeline};

/// A pipeline over a fresh in-memory store, with the event channel wired.
pub fn test_pipeline(registry: CaseRegistry) -> (Arc<TrafficPipeline>, mpsc::Receiver<PipelineEvent>) {
    let (tx, rx) = mpsc::channel(256);
    let pipeline = Arc::new(
        TrafficPipeline::new(Arc::new(MemoryStore::new()), registry).with_events(tx),
    );
    (pipeline, rx)
}

/// Next `Resolved` event, skipping script logs and win notifications.
pub async fn next_resolved(rx: &mut mpsc::Receiver<PipelineEvent>) -> NetworkRequest {
    loop {
        let event = timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("pipeline produced no event in time")
            .expect("event channel closed");
        if let PipelineEvent::Resolved(request) = event {
            return request;
        }
    }
}

/// Resolve the next request and also report whether a `CaseSolved` event
/// arrived alongside it (before or after the resolution).
pub async fn next_resolved_with_win(
    rx: &mut mpsc::Receiver<PipelineEvent>,
) -> (NetworkRequest, Option<String>) {
    let mut solved = None;
    let mut resolved = None;
    while resolved.is_none() || solved.is_none() {
        let event = match timeout(Duration::from_secs(60), rx.recv()).await {
            Ok(Some(event)) => event,
            _ => break,
        };
        match event {
            PipelineEvent::Resolved(request) => resolved = Some(request),
            PipelineEvent::CaseSolved { case_id } => solved = Some(case_id),
            PipelineEvent::ScriptLog(_) => {}
        }
        // a lost request never produces a win; don't wait for one
        if let Some(request) = &resolved {
            if request.status != 200 {
                break;
            }
        }
    }
    (resolved.expect("no resolution arrived"), solved)
}
