//! Core data types for simulated traffic
//!
//! A [`NetworkRequest`] is the unit of work flowing through the pipeline.
//! It carries both the request and the (eventually resolved) response side;
//! `status == 0` marks a record that is still pending or paused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Resource class of a simulated request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Document,
    Xhr,
    Fetch,
    Script,
    Stylesheet,
    Image,
    Font,
}

impl ResourceType {
    /// Whether requests of this class are dispatched to backend simulation.
    /// Everything else resolves synchronously with a canned body.
    pub fn is_simulated(&self) -> bool {
        matches!(
            self,
            ResourceType::Fetch | ResourceType::Xhr | ResourceType::Image
        )
    }
}

/// A simulated HTTP exchange as it appears in the traffic list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkRequest {
    /// Unique identity, assigned at creation, never reused
    pub id: String,
    pub url: String,
    pub method: String,
    pub request_headers: HashMap<String, String>,
    pub request_body: Option<String>,
    /// 0 = pending/in-flight sentinel; nonzero = resolved
    pub status: u16,
    pub status_text: String,
    pub response_headers: HashMap<String, String>,
    pub response_body: String,
    /// Response size in bytes
    pub size: u64,
    /// Simulated duration in milliseconds
    pub time_ms: u64,
    pub protocol: String,
    pub remote_address: String,
    pub resource_type: ResourceType,
    /// True while held at a breakpoint
    pub is_paused: bool,
    pub timestamp: DateTime<Utc>,
}

impl NetworkRequest {
    /// Create a fresh pending request
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        resource_type: ResourceType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: url.into(),
            method: method.into(),
            request_headers: HashMap::new(),
            request_body: None,
            status: 0,
            status_text: String::new(),
            response_headers: HashMap::new(),
            response_body: String::new(),
            size: 0,
            time_ms: 0,
            protocol: "HTTP/1.1".to_string(),
            remote_address: "127.0.0.1".to_string(),
            resource_type,
            is_paused: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// A request with `status == 0` is either awaiting backend simulation or
    /// held at a breakpoint; `is_paused` distinguishes the two.
    pub fn is_pending(&self) -> bool {
        self.status == 0
    }

    /// Case-insensitive lookup on the request side
    pub fn request_header(&self, key: &str) -> Option<&str> {
        lookup(&self.request_headers, key)
    }

    /// Case-insensitive lookup on the response side
    pub fn response_header(&self, key: &str) -> Option<&str> {
        lookup(&self.response_headers, key)
    }

    /// Set a request header, replacing any existing value under a
    /// case-insensitive match of the key
    pub fn set_request_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        insert(&mut self.request_headers, key.into(), value.into());
    }

    /// Set a response header, replacing any existing value under a
    /// case-insensitive match of the key
    pub fn set_response_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        insert(&mut self.response_headers, key.into(), value.into());
    }
}

fn lookup<'a>(headers: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn insert(headers: &mut HashMap<String, String>, key: String, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
    headers.insert(key, value);
}
