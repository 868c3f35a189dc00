//! 限流模块：按调用方标识的固定窗口请求计数器。
//!
//! # Rate Limiting Module
//!
//! Per-identifier request budgeting in front of a quota-limited upstream.
//! Each identifier gets a fixed window of `max_requests`; when the window
//! elapses the budget reopens in full.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FixedWindowLimiter`] | Fixed-window counter keyed by identifier |
//! | [`RateLimitConfig`] | Window length, budget, sweep cadence |
//! | [`RateLimitDecision`] | allowed / remaining / reset-at for one request |
//! | [`UsageSnapshot`] | Read-only usage view from `peek_stats` |
//!
//! Fixed windows trade precision for simplicity: a burst straddling the
//! window boundary can briefly reach twice the budget. The decision carries
//! everything a caller needs to build `X-RateLimit-*` style headers.
//!
//! ```rust
//! use resumatch_core::limiter::{FixedWindowLimiter, RateLimitConfig};
//! use std::time::Duration;
//!
//! let limiter = FixedWindowLimiter::new(
//!     RateLimitConfig::new()
//!         .with_window(Duration::from_secs(60))
//!         .with_max_requests(10),
//! );
//!
//! let decision = limiter.check("203.0.113.7");
//! assert!(decision.allowed);
//! assert_eq!(decision.remaining, 9);
//! ```

pub mod fixed_window;

pub use fixed_window::{FixedWindowLimiter, RateLimitConfig, RateLimitDecision, UsageSnapshot};
