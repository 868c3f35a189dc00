//! 结果缓存模块：内容寻址的 TTL 键值存储，避免对上游的重复调用。
//!
//! # Result Caching Module
//!
//! Content-addressed caching of analysis results, so identical input pairs
//! are served from memory instead of re-invoking the slow, metered upstream.
//! Eviction is purely time-based.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TtlCache`] | In-memory key/value store with per-entry TTL |
//! | [`TtlCacheConfig`] | Default TTL and sweep cadence |
//! | [`derive_key`] | SHA-256 content key over a normalized input pair |
//! | [`normalize_text`] | Control-char strip + CRLF fold + trim |
//!
//! Keys are derived from the content itself, so the same resume and job
//! description hit the same entry no matter who submits them, and raw
//! (potentially sensitive) text never becomes a map key.
//!
//! ## Example
//!
//! ```rust
//! use resumatch_core::cache::{derive_key, TtlCache, TtlCacheConfig};
//! use std::time::Duration;
//!
//! let cache: TtlCache<String> = TtlCache::new(
//!     TtlCacheConfig::new().with_default_ttl(Duration::from_secs(1800)),
//! );
//!
//! let key = derive_key("resume text", "job description");
//! cache.set(key.clone(), "cached analysis".to_string());
//! assert!(cache.get(&key).is_some());
//! ```

mod key;
mod store;

pub use key::{derive_key, normalize_text};
pub use store::{TtlCache, TtlCacheConfig};
