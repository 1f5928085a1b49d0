//! Insecure direct object reference: read someone else's order
//!
//! The order endpoint takes a numeric id straight from the URL and never
//! checks who is asking. Order 1001 belongs to the player; fetching 1002
//! returns another customer's order, which is the win condition.

use crate::case::{CaseStudy, Difficulty, SimulatedOutcome, SimulatedResponse};
use traffic_core::NetworkRequest;

pub fn case_study() -> CaseStudy {
    CaseStudy {
        id: "idor-orders".to_string(),
        title: "Somebody Else's Receipt".to_string(),
        category: "Access Control".to_string(),
        difficulty: Difficulty::Beginner,
        narrative: "Your order confirmation page loads /orders/1001. The number \
                    in the URL looks awfully sequential."
            .to_string(),
        initial_url: "https://shop.example/account/orders".to_string(),
    }
}

pub fn handle(request: &NetworkRequest) -> SimulatedOutcome {
    if request.method != "GET" {
        return SimulatedOutcome::plain(SimulatedResponse::with_status(
            405,
            "Method Not Allowed",
            r#"{"error": "read-only endpoint"}"#,
        ));
    }
    let order_id = match order_id_from_url(&request.url) {
        Some(id) => id,
        None => {
            return SimulatedOutcome::plain(SimulatedResponse::with_status(
                404,
                "Not Found",
                r#"{"error": "unknown endpoint"}"#,
            ))
        }
    };

    match order_id {
        1001 => SimulatedOutcome::plain(SimulatedResponse::ok(
            serde_json::json!({
                "order": 1001,
                "customer": "you",
                "items": [{"sku": "GX-9000", "qty": 1}],
                "total": 2499,
            })
            .to_string(),
        )),
        1002 => SimulatedOutcome::solved(SimulatedResponse::ok(
            serde_json::json!({
                "order": 1002,
                "customer": "m.hoffmann",
                "shipping_address": "Bergstrasse 12, 10115 Berlin",
                "items": [{"sku": "CAM-550", "qty": 3}],
                "total": 897,
            })
            .to_string(),
        )),
        _ => SimulatedOutcome::plain(SimulatedResponse::with_status(
            404,
            "Not Found",
            serde_json::json!({ "error": "no such order", "order": order_id }).to_string(),
        )),
    }
}

fn order_id_from_url(url: &str) -> Option<u64> {
    let (_, rest) = url.split_once("/orders/")?;
    let id_part = rest.split(['/', '?', '#']).next()?;
    id_part.parse().ok()
}
