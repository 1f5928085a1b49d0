//! Throttle profiles and the simulated bandwidth/latency calculator
//!
//! Nothing here touches a real network; "latency" is a number the pipeline
//! sleeps on and "packet loss" is a Bernoulli draw over in-memory objects.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A named bundle of simulated network conditions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThrottleProfile {
    pub name: String,
    pub enabled: bool,
    /// Simulated download bandwidth in KB/s, 0 = unlimited
    pub download_kbps: u32,
    /// Simulated upload bandwidth in KB/s, 0 = unlimited
    pub upload_kbps: u32,
    /// Additive latency in milliseconds
    pub latency_ms: u64,
    /// Packet loss probability in percent, 0-100
    pub packet_loss_pct: u8,
}

impl ThrottleProfile {
    /// The do-nothing profile selected by default
    pub fn unthrottled() -> Self {
        Self {
            name: "Unthrottled".to_string(),
            enabled: false,
            download_kbps: 0,
            upload_kbps: 0,
            latency_ms: 0,
            packet_loss_pct: 0,
        }
    }
}

impl Default for ThrottleProfile {
    fn default() -> Self {
        Self::unthrottled()
    }
}

/// Immutable reference profiles offered by the UI. User-authored profiles
/// live in the separate "custom" slot and never overwrite these.
pub fn presets() -> Vec<ThrottleProfile> {
    vec![
        ThrottleProfile::unthrottled(),
        ThrottleProfile {
            name: "Regular 3G".to_string(),
            enabled: true,
            download_kbps: 96,
            upload_kbps: 32,
            latency_ms: 300,
            packet_loss_pct: 0,
        },
        ThrottleProfile {
            name: "Slow Wi-Fi".to_string(),
            enabled: true,
            download_kbps: 400,
            upload_kbps: 200,
            latency_ms: 120,
            packet_loss_pct: 2,
        },
        ThrottleProfile {
            name: "Flaky Satellite".to_string(),
            enabled: true,
            download_kbps: 64,
            upload_kbps: 16,
            latency_ms: 900,
            packet_loss_pct: 15,
        },
    ]
}

/// Outcome of the delay computation for a resolved response.
///
/// `Unreachable` is the explicit form of the total-failure case: a profile
/// with 100% packet loss can never deliver, so callers get a dedicated
/// variant instead of a delay they would wait on for nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    /// Deliver after this many milliseconds
    Wait(u64),
    /// The profile drops every packet; no delivery will happen
    Unreachable,
}

/// Bernoulli draw at the profile's packet-loss percentage.
pub fn should_drop_packet(profile: &ThrottleProfile) -> bool {
    should_drop_packet_with(profile, &mut rand::thread_rng())
}

/// Same draw over an injected RNG, for deterministic tests.
pub fn should_drop_packet_with<R: Rng>(profile: &ThrottleProfile, rng: &mut R) -> bool {
    if !profile.enabled || profile.packet_loss_pct == 0 {
        return false;
    }
    if profile.packet_loss_pct >= 100 {
        return true;
    }
    rng.gen_range(0..100u8) < profile.packet_loss_pct
}

/// Compute the delivery delay for a response of `size_bytes`, starting from
/// `base_ms`. The profile adds its latency plus a transfer time of
/// size / download speed when a speed limit is set.
pub fn compute_delay(base_ms: u64, size_bytes: u64, profile: &ThrottleProfile) -> DelayOutcome {
    if !profile.enabled {
        return DelayOutcome::Wait(base_ms);
    }
    if profile.packet_loss_pct >= 100 {
        return DelayOutcome::Unreachable;
    }
    let mut delay = base_ms + profile.latency_ms;
    if profile.download_kbps > 0 {
        delay += size_bytes / profile.download_kbps as u64;
    }
    DelayOutcome::Wait(delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn profile(loss: u8) -> ThrottleProfile {
        ThrottleProfile {
            name: "test".to_string(),
            enabled: true,
            download_kbps: 100,
            upload_kbps: 50,
            latency_ms: 200,
            packet_loss_pct: loss,
        }
    }

    #[test]
    fn test_zero_loss_never_drops() {
        let p = profile(0);
        for _ in 0..1000 {
            assert!(!should_drop_packet(&p));
        }
    }

    #[test]
    fn test_total_loss_always_drops() {
        let p = profile(100);
        for _ in 0..1000 {
            assert!(should_drop_packet(&p));
        }
    }

    #[test]
    fn test_disabled_profile_never_drops() {
        let mut p = profile(100);
        p.enabled = false;
        assert!(!should_drop_packet(&p));
    }

    #[test]
    fn test_partial_loss_drops_roughly_at_rate() {
        let p = profile(50);
        let mut rng = StdRng::seed_from_u64(7);
        let drops = (0..10_000)
            .filter(|_| should_drop_packet_with(&p, &mut rng))
            .count();
        assert!((4_000..6_000).contains(&drops), "drops = {}", drops);
    }

    #[test]
    fn test_delay_adds_latency_and_transfer_time() {
        let p = profile(0);
        // 100 KB/s -> 1 ms per 100 bytes
        assert_eq!(compute_delay(100, 50_000, &p), DelayOutcome::Wait(100 + 200 + 500));
    }

    #[test]
    fn test_delay_unlimited_speed_skips_transfer_time() {
        let mut p = profile(0);
        p.download_kbps = 0;
        assert_eq!(compute_delay(100, 1_000_000, &p), DelayOutcome::Wait(300));
    }

    #[test]
    fn test_delay_disabled_profile_is_base_only() {
        let mut p = profile(0);
        p.enabled = false;
        assert_eq!(compute_delay(100, 50_000, &p), DelayOutcome::Wait(100));
    }

    #[test]
    fn test_total_loss_is_unreachable() {
        assert_eq!(compute_delay(100, 10, &profile(100)), DelayOutcome::Unreachable);
    }

    proptest! {
        // Larger payloads never get faster under the same profile.
        #[test]
        fn prop_delay_monotonic_in_size(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let p = profile(0);
            let (small, big) = if a <= b { (a, b) } else { (b, a) };
            match (compute_delay(100, small, &p), compute_delay(100, big, &p)) {
                (DelayOutcome::Wait(s), DelayOutcome::Wait(l)) => prop_assert!(s <= l),
                _ => prop_assert!(false),
            }
        }
    }
}
