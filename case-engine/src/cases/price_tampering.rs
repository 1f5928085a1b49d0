//! Price tampering: edit the checkout request until the order goes through
//!
//! The storefront posts the price the client claims to pay. The simulated
//! backend trusts it blindly, which is the lesson: submitting a price in
//! (0, 1000] completes the purchase, anything above is rejected as if the
//! account had insufficient funds.

use crate::case::{CaseStudy, Difficulty, SimulatedOutcome, SimulatedResponse};
use traffic_core::NetworkRequest;

pub fn case_study() -> CaseStudy {
    CaseStudy {
        id: "price-tampering".to_string(),
        title: "The Overpriced Router".to_string(),
        category: "Business Logic".to_string(),
        difficulty: Difficulty::Beginner,
        narrative: "The gaming router you want costs 2499 credits but your \
                    account only holds 1000. The checkout call sends the price \
                    from the client. Maybe the backend believes whatever it is told."
            .to_string(),
        initial_url: "https://shop.example/products/gx-9000".to_string(),
    }
}

pub fn handle(request: &NetworkRequest) -> SimulatedOutcome {
    if request.method != "POST" || !request.url.contains("/checkout") {
        return SimulatedOutcome::plain(SimulatedResponse::with_status(
            404,
            "Not Found",
            r#"{"error": "unknown endpoint"}"#,
        ));
    }

    let body = match &request.request_body {
        Some(body) => body,
        None => return SimulatedOutcome::plain(SimulatedResponse::bad_request("missing body")),
    };
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            return SimulatedOutcome::plain(SimulatedResponse::bad_request("body is not valid JSON"))
        }
    };
    let price = match parsed.get("price").and_then(|p| p.as_f64()) {
        Some(p) => p,
        None => {
            return SimulatedOutcome::plain(SimulatedResponse::bad_request("price field missing"))
        }
    };

    if price <= 0.0 {
        return SimulatedOutcome::plain(SimulatedResponse::bad_request("price must be positive"));
    }
    if price > 1000.0 {
        return SimulatedOutcome::plain(SimulatedResponse::with_status(
            403,
            "Insufficient Funds",
            serde_json::json!({
                "error": "Insufficient Funds",
                "balance": 1000,
                "required": price,
            })
            .to_string(),
        ));
    }

    SimulatedOutcome::solved(SimulatedResponse::ok(
        serde_json::json!({
            "order": "ORD-83412",
            "status": "confirmed",
            "charged": price,
        })
        .to_string(),
    ))
}
