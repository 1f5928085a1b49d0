//! Case study metadata and simulated response shapes

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// A self-contained training scenario. Read-only content; the simulator
/// consumes it as configuration, it never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStudy {
    pub id: String,
    pub title: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub narrative: String,
    /// The page the simulated browser opens when the case starts
    pub initial_url: String,
}

/// A fabricated backend response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Simulated server processing time in milliseconds
    pub time_ms: u64,
}

impl SimulatedResponse {
    /// A 200 with a JSON body and a plausible-looking processing time
    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, "OK", body)
    }

    pub fn with_status(status: u16, status_text: &str, body: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status,
            status_text: status_text.to_string(),
            headers,
            body: body.into(),
            time_ms: rand::thread_rng().gen_range(40u64..180),
        }
    }

    /// Canned 400 for request bodies a condition needed to parse but could not
    pub fn bad_request(detail: &str) -> Self {
        Self::with_status(
            400,
            "Bad Request",
            serde_json::json!({ "error": detail }).to_string(),
        )
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

/// What a case handler hands back to the pipeline: the response to deliver,
/// and an out-of-band signal for the game-progression layer. `solved` is not
/// part of the HTTP semantics.
#[derive(Debug, Clone)]
pub struct SimulatedOutcome {
    pub response: SimulatedResponse,
    pub solved: bool,
}

impl SimulatedOutcome {
    pub fn plain(response: SimulatedResponse) -> Self {
        Self {
            response,
            solved: false,
        }
    }

    pub fn solved(response: SimulatedResponse) -> Self {
        Self {
            response,
            solved: true,
        }
    }
}
