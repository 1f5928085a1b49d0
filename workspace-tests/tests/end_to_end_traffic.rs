//! End-to-end scenarios through the full pipeline

use case_engine::CaseRegistry;
use traffic_core::rules::{
    AccessRule, AccessRuleKind, MapLocalRule, MirrorRule, ReverseProxyRule, RewriteAction,
    RewriteRule,
};
use traffic_core::{NetworkRequest, ResourceType};
use workspace_tests::{next_resolved, next_resolved_with_win, test_pipeline};

fn checkout(body: &str) -> NetworkRequest {
    NetworkRequest::new("POST", "https://shop.example/checkout", ResourceType::Xhr)
        .with_header("Content-Type", "application/json")
        .with_body(body)
}

#[tokio::test(start_paused = true)]
async fn price_tampering_full_price_is_rejected() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("price-tampering").await;

    pipeline.submit(checkout(r#"{"price": 2499}"#)).await;
    let resolved = next_resolved(&mut rx).await;

    assert_eq!(resolved.status, 403);
    assert_eq!(resolved.status_text, "Insufficient Funds");
    assert!(!pipeline.completed_cases().is_completed("price-tampering"));
}

#[tokio::test(start_paused = true)]
async fn price_tampering_edited_price_wins_the_case() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("price-tampering").await;

    pipeline.submit(checkout(r#"{"price": 1}"#)).await;
    let (resolved, solved) = next_resolved_with_win(&mut rx).await;

    assert_eq!(resolved.status, 200);
    assert_eq!(solved.as_deref(), Some("price-tampering"));
    assert!(pipeline.completed_cases().is_completed("price-tampering"));
}

#[tokio::test(start_paused = true)]
async fn price_tampering_malformed_body_maps_to_400() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("price-tampering").await;

    pipeline.submit(checkout("{not json")).await;
    let resolved = next_resolved(&mut rx).await;
    assert_eq!(resolved.status, 400);
}

#[tokio::test(start_paused = true)]
async fn idor_own_order_then_foreign_order() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("idor-orders").await;

    pipeline
        .submit(NetworkRequest::new(
            "GET",
            "https://shop.example/orders/1001",
            ResourceType::Fetch,
        ))
        .await;
    let own = next_resolved(&mut rx).await;
    assert_eq!(own.status, 200);
    assert!(own.response_body.contains("\"customer\":\"you\""));
    assert!(!pipeline.completed_cases().is_completed("idor-orders"));

    pipeline
        .submit(NetworkRequest::new(
            "GET",
            "https://shop.example/orders/1002",
            ResourceType::Fetch,
        ))
        .await;
    let (foreign, solved) = next_resolved_with_win(&mut rx).await;
    assert_eq!(foreign.status, 200);
    assert!(foreign.response_body.contains("m.hoffmann"));
    assert_eq!(solved.as_deref(), Some("idor-orders"));
}

#[tokio::test(start_paused = true)]
async fn mirror_runs_before_rewrite_matching() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    pipeline.stores().mirror.save(&[MirrorRule {
        id: "m1".to_string(),
        name: "prod to test".to_string(),
        enabled: true,
        source_pattern: "https://prod.example/*".to_string(),
        target_origin: "https://test.example".to_string(),
    }]);
    // matches the mirrored host only; proves mirror ran first
    pipeline.stores().rewrite.save(&[RewriteRule {
        id: "r1".to_string(),
        name: "tag test env".to_string(),
        enabled: true,
        url_pattern: "https://test.example/*".to_string(),
        action: RewriteAction::SetRequestHeader {
            key: "X-Env".to_string(),
            value: "test".to_string(),
        },
    }]);

    pipeline
        .submit(NetworkRequest::new(
            "GET",
            "https://prod.example/api/x",
            ResourceType::Fetch,
        ))
        .await;
    let resolved = next_resolved(&mut rx).await;

    assert_eq!(resolved.url, "https://test.example/api/x");
    assert_eq!(resolved.request_header("x-env"), Some("test"));
}

#[tokio::test(start_paused = true)]
async fn access_control_whitelist_denies_everything_else() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    // one whitelist rule, zero blacklist rules
    pipeline.stores().access_control.save(&[AccessRule {
        id: "w1".to_string(),
        name: "only the shop".to_string(),
        enabled: true,
        pattern: "https://shop.example/*".to_string(),
        kind: AccessRuleKind::Whitelist,
    }]);

    pipeline
        .submit(NetworkRequest::new(
            "GET",
            "https://other.example/api",
            ResourceType::Fetch,
        ))
        .await;
    let denied = next_resolved(&mut rx).await;
    assert_eq!(denied.status, 403);
    assert_eq!(denied.response_header("x-blocked-by"), Some("access-control"));
    assert_eq!(denied.response_header("x-rule"), Some("default-deny"));
    let body: serde_json::Value = serde_json::from_str(&denied.response_body).unwrap();
    assert_eq!(body["error"], "blocked by access control");

    pipeline
        .submit(NetworkRequest::new(
            "GET",
            "https://shop.example/api",
            ResourceType::Fetch,
        ))
        .await;
    let allowed = next_resolved(&mut rx).await;
    assert_eq!(allowed.status, 200);
}

#[tokio::test(start_paused = true)]
async fn map_local_overrides_backend_body_but_not_status() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::with_builtins());
    pipeline.set_active_case("price-tampering").await;
    pipeline.stores().map_local.save(&[MapLocalRule {
        id: "ml1".to_string(),
        name: "canned checkout".to_string(),
        enabled: true,
        url_pattern: "https://shop.example/checkout".to_string(),
        content: r#"{"override": true}"#.to_string(),
        content_type: "application/json".to_string(),
    }]);

    // backend still runs and decides the status (403 here)
    pipeline.submit(checkout(r#"{"price": 2499}"#)).await;
    let resolved = next_resolved(&mut rx).await;
    assert_eq!(resolved.status, 403);
    assert_eq!(resolved.response_body, r#"{"override": true}"#);
    assert_eq!(
        resolved.response_header("content-type"),
        Some("application/json")
    );
}

#[tokio::test(start_paused = true)]
async fn reverse_proxy_rewrites_url_and_tags_headers() {
    let (pipeline, mut rx) = test_pipeline(CaseRegistry::new());
    pipeline.stores().reverse_proxy.save(&[ReverseProxyRule {
        id: "rp1".to_string(),
        name: "api gateway".to_string(),
        enabled: true,
        listen_path: "https://shop.example/api/*".to_string(),
        target_url: "https://backend.example/v2".to_string(),
        rewrite_path: true,
    }]);

    pipeline
        .submit(NetworkRequest::new(
            "GET",
            "https://shop.example/api/users/7",
            ResourceType::Fetch,
        ))
        .await;
    let resolved = next_resolved(&mut rx).await;

    assert_eq!(resolved.url, "https://backend.example/v2/users/7");
    assert_eq!(resolved.request_header("x-reverse-proxy"), Some("api gateway"));
    assert_eq!(
        resolved.request_header("x-original-url"),
        Some("https://shop.example/api/users/7")
    );
}
