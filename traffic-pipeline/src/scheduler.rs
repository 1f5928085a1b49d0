//! Simulated-latency timer seam
//!
//! Every stage that models network delay sleeps through this trait, so the
//! whole pipeline runs on tokio's virtual clock in tests instead of real
//! timers scattered across call sites.

use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Resolve after `ms` of simulated time.
    async fn delay(&self, ms: u64);
}

/// Production scheduler over `tokio::time`
#[derive(Debug, Default, Clone)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn delay(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
