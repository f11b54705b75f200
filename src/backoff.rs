//! Reconnect backoff: pure functions over [`ReconnectConfig`] (spec §4.3).

use rand::Rng;

use crate::config::ReconnectConfig;

/// Compute the delay before the `retry_count`-th reconnect attempt
/// (`retry_count >= 1`), applying jitter when configured.
pub(crate) fn calculate_backoff(cfg: &ReconnectConfig, retry_count: u32) -> u64 {
    let exponent = retry_count.saturating_sub(1);
    let raw = cfg.base_interval_ms as f64 * cfg.multiplier.powi(exponent as i32);
    let interval = raw.min(cfg.max_interval_ms as f64);

    if cfg.jitter <= 0.0 {
        return interval.round() as u64;
    }

    let low = interval * (1.0 - cfg.jitter);
    let high = interval * (1.0 + cfg.jitter);
    let mut rng = rand::thread_rng();
    rng.gen_range(low..=high).round() as u64
}

/// Whether another reconnect attempt should be made after `retry_count`
/// failures, per spec §4.3's truth table.
pub(crate) fn should_reconnect(cfg: &ReconnectConfig, retry_count: u32) -> bool {
    if !cfg.auto_reconnect {
        return false;
    }
    if cfg.max_retry < 0 {
        return true;
    }
    i64::from(retry_count) < cfg.max_retry
}
