//! Built-in case studies
//!
//! Each module exports `case_study()` (catalog metadata) and `handle`
//! (the backend simulation for that scenario).

pub mod auth_bypass;
pub mod idor_orders;
pub mod price_tampering;
