use std::time::Duration;

use marketstream_core::ReconnectPolicy;
use rand::Rng;

/// Delay before reconnect `attempt` (1-based), before jitter.
///
/// Grows by `backoff_factor` per consecutive attempt and is capped at
/// `max_reconnect_delay`, which never lowers the base delay itself.
pub fn reconnect_delay(policy: &ReconnectPolicy, attempt: u32) -> Duration {
    let base = policy.reconnect_delay;
    if policy.backoff_factor <= 1 || attempt <= 1 {
        return base;
    }
    let growth = policy
        .backoff_factor
        .checked_pow(attempt - 1)
        .unwrap_or(u32::MAX);
    let cap = policy.max_reconnect_delay.max(base);
    base.saturating_mul(growth).min(cap)
}

/// Add up to `jitter_percent` of `base` as random extra wait.
pub fn jitter_wait(base: Duration, jitter_percent: u8) -> Duration {
    if jitter_percent == 0 || base.is_zero() {
        return base;
    }
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let jitter_range = std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100);
    let mut rng = rand::rng();
    base.saturating_add(Duration::from_millis(rng.random_range(0..jitter_range)))
}
