use case_engine::CaseRegistry;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use traffic_core::rules::{GatewayRule, RewriteAction, RewriteRule};
use traffic_core::{NetworkRequest, ResourceType};
use traffic_pipeline::{MemoryStore, PipelineEvent, TrafficPipeline};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// trafficlab - scripted demo run of the simulated traffic pipeline
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Case study to activate
    #[arg(long, default_value = "price-tampering")]
    case: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "traffic_pipeline=info,traffic_core=info,case_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (tx, mut rx) = mpsc::channel(64);
    let pipeline = Arc::new(
        TrafficPipeline::new(Arc::new(MemoryStore::new()), CaseRegistry::with_builtins())
            .with_events(tx),
    );
    pipeline.set_active_case(&args.case).await;

    // a couple of rules so the demo traffic shows the engines at work
    pipeline.stores().gateway.save(&[GatewayRule {
        id: "demo-gw".to_string(),
        name: "block trackers".to_string(),
        enabled: true,
        url_pattern: "https://tracker.example/*".to_string(),
    }]);
    pipeline.stores().rewrite.save(&[RewriteRule {
        id: "demo-rw".to_string(),
        name: "tag environment".to_string(),
        enabled: true,
        url_pattern: "https://shop.example/*".to_string(),
        action: RewriteAction::SetRequestHeader {
            key: "X-Env".to_string(),
            value: "lab".to_string(),
        },
    }]);

    let submissions = vec![
        NetworkRequest::new("GET", "https://shop.example/", ResourceType::Document),
        NetworkRequest::new("GET", "https://tracker.example/pixel.gif", ResourceType::Image),
        NetworkRequest::new("POST", "https://shop.example/checkout", ResourceType::Xhr)
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"price": 2499, "item": "gx-9000"}"#),
        NetworkRequest::new("POST", "https://shop.example/checkout", ResourceType::Xhr)
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"price": 1, "item": "gx-9000"}"#),
    ];
    let total = submissions.len();
    for request in submissions {
        pipeline.submit(request).await;
    }

    let mut resolved = 0;
    while resolved < total {
        match rx.recv().await {
            Some(PipelineEvent::Resolved(request)) => {
                resolved += 1;
                println!(
                    "{:>3} {:<7} {:<45} {} {} ({} ms)",
                    resolved, request.method, request.url, request.status, request.status_text,
                    request.time_ms
                );
            }
            Some(PipelineEvent::CaseSolved { case_id }) => {
                println!("    case '{}' solved", case_id);
            }
            Some(PipelineEvent::ScriptLog(entry)) => {
                println!("    [script:{}] {}: {}", entry.rule_name, entry.level, entry.message);
            }
            None => break,
        }
    }

    Ok(())
}
