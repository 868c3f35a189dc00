//! # resumatch-core
//!
//! Resumatch 的请求治理核心：按调用方限流、按内容寻址缓存、以及面向生成式上游的弹性调用客户端。
//!
//! Request governance core for the Resumatch analyzer. The crate sits between
//! inbound requests and a slow, quota-limited, non-deterministic generative
//! upstream, and provides the governors every call passes through plus the
//! telemetry that observes them.
//!
//! ## Overview
//!
//! - **Rate limiting**: fixed-window, per-identifier request budgets
//! - **Result caching**: content-addressed keys with TTL-only eviction, so
//!   identical submissions are served from memory
//! - **Resilient invocation**: capped exponential backoff, per-attempt
//!   timeouts, and typed fallback values for every degraded path short of a
//!   hard upstream failure
//! - **Telemetry**: a bounded ring buffer of operational events
//!
//! Orchestration composes them in order: check the limiter, try the cache,
//! invoke the upstream on a miss, store the result. Each component is an
//! explicitly constructed value with its own lifecycle; there are no
//! process-wide singletons.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumatch_core::analysis::AnalysisResult;
//! use resumatch_core::cache::{derive_key, TtlCache, TtlCacheConfig};
//! use resumatch_core::client::{parse_string_array, GeminiClient, GeminiConfig, GenerateRequest};
//! use resumatch_core::limiter::{FixedWindowLimiter, RateLimitConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> resumatch_core::Result<()> {
//!     let limiter = FixedWindowLimiter::new(RateLimitConfig::default());
//!     let cache: TtlCache<AnalysisResult> = TtlCache::new(TtlCacheConfig::default());
//!     let client = GeminiClient::new(GeminiConfig::from_env()?)?;
//!
//!     if !limiter.check("203.0.113.7").allowed {
//!         return Ok(());
//!     }
//!
//!     let key = derive_key("resume text", "job description");
//!     if cache.get(&key).is_none() {
//!         let request = GenerateRequest::new("Extract keywords.", "job description");
//!         let schema = json!({"type": "ARRAY", "items": {"type": "STRING"}});
//!         let keywords = client
//!             .invoke(&request, &schema, parse_string_array, Vec::new())
//!             .await?;
//!         println!("extracted {} keywords", keywords.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`limiter`] | Fixed-window per-identifier rate limiting |
//! | [`cache`] | Content-addressed TTL result cache |
//! | [`client`] | Resilient Gemini invocation with backoff and fallback |
//! | [`telemetry`] | Bounded operational event recording |
//! | [`analysis`] | Analysis result types and keyword matching |
//! | [`sweep`] | Cancellable periodic background tasks |

pub mod analysis;
pub mod cache;
pub mod client;
pub mod limiter;
pub mod sweep;
pub mod telemetry;

// Re-export main types for convenience
pub use analysis::{dedupe_keywords, match_keywords, AnalysisResult, Suggestion, SuggestionList};
pub use cache::{derive_key, TtlCache, TtlCacheConfig};
pub use client::{GeminiClient, GeminiConfig, GenerateRequest};
pub use limiter::{FixedWindowLimiter, RateLimitConfig, RateLimitDecision, UsageSnapshot};
pub use sweep::SweepHandle;
pub use telemetry::{Event, EventKind, EventRecorder, RecorderStats};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::Error;
