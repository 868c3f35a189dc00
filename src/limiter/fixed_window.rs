use crate::sweep::{spawn_sweeper, SweepHandle};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of a single [`FixedWindowLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// When the current window ends and the counter resets.
    pub reset_at: Instant,
}

/// Point-in-time usage for one identifier, read without counting a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub count: u32,
    pub remaining: u32,
    pub reset_at: Instant,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: 10,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window length
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Set the per-window request budget
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    /// Set how often the background sweep runs
    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every;
        self
    }
}

#[derive(Debug, Clone)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by caller identifier.
///
/// Windows are fixed, not sliding: an identifier's counter resets in full at
/// `reset_at`, so a caller can fit up to `2 × max_requests` calls into the
/// instants straddling a window boundary. That burst allowance is part of the
/// algorithm's contract.
///
/// Exhausted budgets are reported through `allowed = false`, never as an
/// error.
pub struct FixedWindowLimiter {
    cfg: RateLimitConfig,
    records: RwLock<HashMap<String, WindowRecord>>,
}

impl FixedWindowLimiter {
    pub fn new(cfg: RateLimitConfig) -> Self {
        Self {
            cfg,
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.cfg
    }

    /// Count one request against `identifier`'s current window.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, Instant::now())
    }

    pub(crate) fn check_at(&self, identifier: &str, now: Instant) -> RateLimitDecision {
        let mut records = match self.records.write() {
            Ok(records) => records,
            // Poisoned map: fail open with a fresh window's worth of budget.
            Err(_) => {
                return RateLimitDecision {
                    allowed: true,
                    remaining: self.cfg.max_requests.saturating_sub(1),
                    reset_at: now + self.cfg.window,
                }
            }
        };

        if let Some(record) = records.get_mut(identifier) {
            if now < record.reset_at {
                if record.count < self.cfg.max_requests {
                    record.count += 1;
                    debug!(identifier, count = record.count, "request allowed");
                    return RateLimitDecision {
                        allowed: true,
                        remaining: self.cfg.max_requests - record.count,
                        reset_at: record.reset_at,
                    };
                }
                warn!(
                    identifier,
                    retry_in_ms = (record.reset_at - now).as_millis() as u64,
                    "rate limit exceeded"
                );
                return RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_at: record.reset_at,
                };
            }
            // Window elapsed: restart it in place.
            record.count = 1;
            record.reset_at = now + self.cfg.window;
            debug!(identifier, "window reset");
            return RateLimitDecision {
                allowed: true,
                remaining: self.cfg.max_requests.saturating_sub(1),
                reset_at: record.reset_at,
            };
        }

        let reset_at = now + self.cfg.window;
        records.insert(
            identifier.to_string(),
            WindowRecord { count: 1, reset_at },
        );
        debug!(identifier, "window opened");
        RateLimitDecision {
            allowed: true,
            remaining: self.cfg.max_requests.saturating_sub(1),
            reset_at,
        }
    }

    /// Current usage for `identifier` without counting a request.
    /// `None` when no live window exists.
    pub fn peek_stats(&self, identifier: &str) -> Option<UsageSnapshot> {
        self.peek_stats_at(identifier, Instant::now())
    }

    pub(crate) fn peek_stats_at(&self, identifier: &str, now: Instant) -> Option<UsageSnapshot> {
        let records = self.records.read().ok()?;
        let record = records.get(identifier)?;
        if now >= record.reset_at {
            return None;
        }
        Some(UsageSnapshot {
            count: record.count,
            remaining: self.cfg.max_requests.saturating_sub(record.count),
            reset_at: record.reset_at,
        })
    }

    /// Drop expired window records. Returns how many were removed.
    ///
    /// Redundant with the lazy reset inside [`check`](Self::check); this
    /// bounds memory for identifiers that never come back.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        if let Ok(mut records) = self.records.write() {
            let before = records.len();
            records.retain(|_, record| now < record.reset_at);
            let dropped = before - records.len();
            if dropped > 0 {
                debug!(dropped, tracked = records.len(), "expired windows swept");
            }
            dropped
        } else {
            0
        }
    }

    /// Identifiers currently tracked, including expired records not yet swept.
    pub fn tracked(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Spawn the periodic background sweep for this limiter.
    pub fn start_sweeper(self: &Arc<Self>) -> SweepHandle {
        let limiter = Arc::clone(self);
        spawn_sweeper("limiter_sweep", self.cfg.sweep_interval, move || {
            limiter.sweep();
        })
    }
}
