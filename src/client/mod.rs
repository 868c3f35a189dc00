//! Gemini 客户端模块：带重试、退避、超时与降级回退的弹性调用封装。
//!
//! # Resilient Client Module
//!
//! One logical call to the generative endpoint, made dependable: sequential
//! attempts under a per-attempt timeout, exponential backoff on upstream
//! rate limiting and transport failures, a short fixed pause on empty
//! responses, and a typed fallback value whenever the budget runs out or the
//! response fails to parse. Only a hard upstream failure (non-2xx other than
//! 429) surfaces as an error.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`GeminiClient`] | Resilient `invoke` over the REST endpoint |
//! | [`GeminiConfig`] | Endpoint, key, model, temperature (env-loadable) |
//! | [`GenerateRequest`] | Prompts plus per-call retry/timeout budget |
//! | [`parse_string_array`] | Keyword-list response parser |
//! | [`parse_suggestions`] | Suggestion-list response parser |
//!
//! ## Example
//!
//! ```rust,no_run
//! use resumatch_core::client::{parse_string_array, GeminiClient, GeminiConfig, GenerateRequest};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> resumatch_core::Result<()> {
//! let client = GeminiClient::new(GeminiConfig::from_env()?)?;
//! let request = GenerateRequest::new(
//!     "Extract the technical keywords as a JSON array of strings.",
//!     "Backend engineer, Rust, Tokio, PostgreSQL...",
//! );
//! let schema = json!({"type": "ARRAY", "items": {"type": "STRING"}});
//!
//! let keywords = client
//!     .invoke(&request, &schema, parse_string_array, Vec::new())
//!     .await?;
//! println!("extracted {} keywords", keywords.len());
//! # Ok(())
//! # }
//! ```

mod backoff;
mod config;
mod parse;
mod request;
mod resilient;

pub use config::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use parse::{parse_string_array, parse_suggestions};
pub use request::{GenerateRequest, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT};
pub use resilient::GeminiClient;
