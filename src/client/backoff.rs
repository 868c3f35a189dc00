//! Retry delay schedules.

use std::time::Duration;

/// Fixed pause before retrying an attempt that returned 2xx with no text.
pub(crate) const EMPTY_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Delay after the upstream returned 429 on `attempt` (1-based):
/// min(1000 x 2^attempt, 10000) ms.
pub(crate) fn rate_limit_backoff(attempt: u32) -> Duration {
    Duration::from_millis(capped_shift(1000, attempt, 10_000))
}

/// Delay after a network failure or timeout on `attempt` (1-based):
/// min(1000 x 2^(attempt-1), 5000) ms.
pub(crate) fn transient_backoff(attempt: u32) -> Duration {
    Duration::from_millis(capped_shift(1000, attempt.saturating_sub(1), 5_000))
}

fn capped_shift(base_ms: u64, exponent: u32, cap_ms: u64) -> u64 {
    let factor = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(cap_ms)
}
