//! Auth bypass: forge a privileged Authorization header
//!
//! The admin endpoint "validates" credentials by base64-decoding the
//! Authorization header and looking for the word admin. Crafting any
//! credential string containing it gets through.

use crate::case::{CaseStudy, Difficulty, SimulatedOutcome, SimulatedResponse};
use base64::prelude::*;
use traffic_core::NetworkRequest;

pub fn case_study() -> CaseStudy {
    CaseStudy {
        id: "auth-bypass".to_string(),
        title: "The Decorative Login".to_string(),
        category: "Authentication".to_string(),
        difficulty: Difficulty::Intermediate,
        narrative: "The staff portal sends whatever you typed as a base64 \
                    Authorization header. The backend's idea of verification \
                    is a substring check."
            .to_string(),
        initial_url: "https://shop.example/staff/login".to_string(),
    }
}

pub fn handle(request: &NetworkRequest) -> SimulatedOutcome {
    let header = match request.request_header("Authorization") {
        Some(h) => h,
        None => {
            return SimulatedOutcome::plain(SimulatedResponse::with_status(
                401,
                "Unauthorized",
                r#"{"error": "credentials required"}"#,
            ))
        }
    };

    if decoded_payload(header).contains("admin") {
        return SimulatedOutcome::solved(
            SimulatedResponse::ok(
                serde_json::json!({
                    "panel": "staff",
                    "role": "admin",
                    "flags": ["orders.refund", "users.impersonate"],
                })
                .to_string(),
            )
            .header("X-Authenticated-As", "admin"),
        );
    }

    SimulatedOutcome::plain(SimulatedResponse::with_status(
        403,
        "Forbidden",
        r#"{"error": "insufficient privileges"}"#,
    ))
}

/// Base64 payload of the header: the part after the scheme for
/// `Basic`/`Bearer`, otherwise the raw value. Undecodable input is treated
/// as an empty payload, not an error.
fn decoded_payload(header: &str) -> String {
    let token = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("Bearer "))
        .unwrap_or(header)
        .trim();
    BASE64_STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_core::ResourceType;

    fn with_auth(value: &str) -> NetworkRequest {
        NetworkRequest::new("GET", "https://shop.example/staff/panel", ResourceType::Fetch)
            .with_header("Authorization", value)
    }

    #[test]
    fn test_missing_header_is_401() {
        let req = NetworkRequest::new("GET", "https://shop.example/staff/panel", ResourceType::Fetch);
        let outcome = handle(&req);
        assert_eq!(outcome.response.status, 401);
        assert!(!outcome.solved);
    }

    #[test]
    fn test_basic_admin_credentials_win() {
        // "admin:hunter2"
        let outcome = handle(&with_auth("Basic YWRtaW46aHVudGVyMg=="));
        assert_eq!(outcome.response.status, 200);
        assert!(outcome.solved);
        assert_eq!(
            outcome.response.headers.get("X-Authenticated-As").map(String::as_str),
            Some("admin")
        );
    }

    #[test]
    fn test_ordinary_user_is_403() {
        // "guest:guest"
        let outcome = handle(&with_auth("Basic Z3Vlc3Q6Z3Vlc3Q="));
        assert_eq!(outcome.response.status, 403);
        assert!(!outcome.solved);
    }

    #[test]
    fn test_raw_base64_token_is_accepted() {
        // "role=admin"
        let outcome = handle(&with_auth("cm9sZT1hZG1pbg=="));
        assert!(outcome.solved);
    }

    #[test]
    fn test_undecodable_header_is_403() {
        let outcome = handle(&with_auth("!!not-base64!!"));
        assert_eq!(outcome.response.status, 403);
    }
}
