//! Throttle timing and script engine behavior through the full pipeline

use case_engine::CaseRegistry;
use std::time::Duration;
use traffic_core::{
    NetworkRequest, ResourceType, ScriptLogLevel, ScriptOp, ScriptRule, ScriptTrigger,
    ScriptValue, ThrottleProfile,
};
use workspace_tests::{next_resolved, test_pipeline};

fn fetch(url: &str) -> NetworkRequest {
    NetworkRequest::new("GET", url, ResourceType::Fetch)
}

#[tokio::test(start_paused = true)]
async fn total_packet_loss_surfaces_as_lost_packet() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    pipeline.stores().throttle.select(ThrottleProfile {
        name: "dead".to_string(),
        enabled: true,
        download_kbps: 0,
        upload_kbps: 0,
        latency_ms: 250,
        packet_loss_pct: 100,
    });

    pipeline.submit(fetch("https://shop.example/api")).await;
    let resolved = next_resolved(&mut rx).await;
    assert_eq!(resolved.status, 0);
    assert_eq!(resolved.status_text, "Packet Lost (Throttle)");
    assert_eq!(resolved.time_ms, 250);
}

#[tokio::test(start_paused = true)]
async fn lossless_profile_adds_its_latency_to_delivery() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    pipeline.stores().throttle.select(ThrottleProfile {
        name: "laggy".to_string(),
        enabled: true,
        download_kbps: 0,
        upload_kbps: 0,
        latency_ms: 700,
        packet_loss_pct: 0,
    });

    let started = tokio::time::Instant::now();
    pipeline.submit(fetch("https://shop.example/api")).await;
    let resolved = next_resolved(&mut rx).await;

    assert_eq!(resolved.status, 200);
    // base delay + profile latency
    assert!(started.elapsed() >= Duration::from_millis(800));
    assert!(resolved.time_ms >= 800);
}

#[tokio::test(start_paused = true)]
async fn throttle_change_applies_to_the_next_request() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());

    pipeline.submit(fetch("https://shop.example/api")).await;
    let unthrottled = next_resolved(&mut rx).await;
    assert_eq!(unthrottled.status, 200);

    pipeline.stores().throttle.select(ThrottleProfile {
        name: "dead".to_string(),
        enabled: true,
        download_kbps: 0,
        upload_kbps: 0,
        latency_ms: 100,
        packet_loss_pct: 100,
    });
    pipeline.submit(fetch("https://shop.example/api")).await;
    let lost = next_resolved(&mut rx).await;
    assert_eq!(lost.status_text, "Packet Lost (Throttle)");
}

#[tokio::test(start_paused = true)]
async fn throwing_script_logs_one_error_and_later_stages_still_run() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    pipeline.stores().scripts.save(&[
        ScriptRule {
            id: "s1".to_string(),
            name: "tagger".to_string(),
            enabled: true,
            url_pattern: "*".to_string(),
            trigger: ScriptTrigger::Request,
            ops: vec![ScriptOp::SetHeader {
                side: None,
                key: "X-First".to_string(),
                value: ScriptValue::Literal {
                    text: "applied".to_string(),
                },
            }],
        },
        ScriptRule {
            id: "s2".to_string(),
            name: "broken reader".to_string(),
            enabled: true,
            url_pattern: "*".to_string(),
            trigger: ScriptTrigger::Request,
            // fails on its first op: the header does not exist
            ops: vec![ScriptOp::SetHeader {
                side: None,
                key: "X-Copy".to_string(),
                value: ScriptValue::Header {
                    side: None,
                    key: "No-Such-Header".to_string(),
                },
            }],
        },
    ]);

    pipeline.submit(fetch("https://shop.example/api")).await;
    let resolved = next_resolved(&mut rx).await;

    // earlier rule's effect survived, the pipeline resolved normally
    assert_eq!(resolved.request_header("x-first"), Some("applied"));
    assert_eq!(resolved.status, 200);

    let errors: Vec<_> = pipeline
        .stores()
        .script_logs
        .entries()
        .into_iter()
        .filter(|e| e.level == ScriptLogLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule_name, "broken reader");
}

#[tokio::test(start_paused = true)]
async fn response_phase_script_sees_the_resolved_response() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    pipeline.stores().scripts.save(&[ScriptRule {
        id: "s1".to_string(),
        name: "stamp response".to_string(),
        enabled: true,
        url_pattern: "*".to_string(),
        trigger: ScriptTrigger::Response,
        ops: vec![
            ScriptOp::SetHeader {
                side: None,
                key: "X-Inspected".to_string(),
                value: ScriptValue::Literal {
                    text: "yes".to_string(),
                },
            },
            ScriptOp::SetStatus {
                code: 418,
                text: Some("I'm a teapot".to_string()),
            },
        ],
    }]);

    pipeline.submit(fetch("https://shop.example/api")).await;
    let resolved = next_resolved(&mut rx).await;

    assert_eq!(resolved.response_header("x-inspected"), Some("yes"));
    assert_eq!(resolved.status, 418);
    assert_eq!(resolved.status_text, "I'm a teapot");
}
