//! Breakpoint hold, resume-with-edit and drop flows

use case_engine::CaseRegistry;
use traffic_core::rules::{BreakpointPhase, BreakpointRule};
use traffic_core::{NetworkRequest, ResourceType};
use workspace_tests::{next_resolved_with_win, test_pipeline};

fn hold_checkout_rule() -> BreakpointRule {
    BreakpointRule {
        id: "bp1".to_string(),
        name: "hold checkout".to_string(),
        enabled: true,
        url_pattern: "https://shop.example/checkout".to_string(),
        phase: BreakpointPhase::Request,
    }
}

async fn wait_until_paused(pipeline: &traffic_pipeline::TrafficPipeline, id: &str) {
    while !pipeline.paused_ids().contains(&id.to_string()) {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn resume_with_edited_body_wins_the_case() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("price-tampering").await;
    pipeline.stores().breakpoints.save(&[hold_checkout_rule()]);

    // the player submits the full price, pauses at the breakpoint,
    // edits the body, resumes
    let request = NetworkRequest::new(
        "POST",
        "https://shop.example/checkout",
        ResourceType::Xhr,
    )
    .with_body(r#"{"price": 2499}"#);
    let id = request.id.clone();
    pipeline.submit(request).await;
    wait_until_paused(&pipeline, &id).await;

    let snapshot = pipeline.requests().await;
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot[0].is_paused);
    assert_eq!(snapshot[0].status, 0);

    pipeline
        .resume(&id, Some(r#"{"price": 1}"#.to_string()))
        .await
        .unwrap();
    let (resolved, solved) = next_resolved_with_win(&mut rx).await;

    assert_eq!(resolved.id, id);
    assert_eq!(resolved.status, 200);
    assert!(!resolved.is_paused);
    assert_eq!(solved.as_deref(), Some("price-tampering"));
}

#[tokio::test(start_paused = true)]
async fn dropped_request_disappears_for_good() {
    let (pipeline, _rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("price-tampering").await;
    pipeline.stores().breakpoints.save(&[hold_checkout_rule()]);

    let request = NetworkRequest::new(
        "POST",
        "https://shop.example/checkout",
        ResourceType::Xhr,
    )
    .with_body(r#"{"price": 1}"#);
    let id = request.id.clone();
    pipeline.submit(request).await;
    wait_until_paused(&pipeline, &id).await;

    pipeline.drop_request(&id).await.unwrap();
    assert!(pipeline.requests().await.is_empty());
    assert!(pipeline.resume(&id, None).await.is_err());
    // never reached the backend, so no win
    assert!(!pipeline.completed_cases().is_completed("price-tampering"));
}

#[tokio::test(start_paused = true)]
async fn resume_on_unpaused_id_is_an_error() {
    let (pipeline, _rx) = test_pipeline(CaseRegistry::new());
    assert!(pipeline.resume("no-such-id", None).await.is_err());
    assert!(pipeline.drop_request("no-such-id").await.is_err());
}
