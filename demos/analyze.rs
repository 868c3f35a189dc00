//! End-to-end resume analysis against the live Gemini API.
//!
//! Composes the full governance flow: rate limiting, cache lookup,
//! resilient upstream calls and keyword analysis.
//!
//! The API key is read from the environment:
//! - GEMINI_API_KEY for Google AI Studio
//!
//! Usage:
//!   GEMINI_API_KEY="your_key" cargo run --example analyze

use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use resumatch_core::client::{parse_string_array, parse_suggestions};
use resumatch_core::{
    derive_key, dedupe_keywords, match_keywords, AnalysisResult, EventRecorder,
    FixedWindowLimiter, GeminiClient, GeminiConfig, GenerateRequest, RateLimitConfig,
    SuggestionList, TtlCache, TtlCacheConfig,
};

const SAMPLE_RESUME: &str = "\
Senior software engineer with eight years of backend experience. \
Built async services in Rust on tokio, operated PostgreSQL and Redis, \
and shipped gRPC APIs with full tracing coverage.";

const SAMPLE_JOB: &str = "\
We are hiring a senior Rust engineer. You will design async services, \
run Kubernetes deployments, and own reliability for our gRPC platform.";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cfg = match GeminiConfig::from_env() {
        Ok(cfg) => cfg,
        Err(_) => {
            eprintln!("GEMINI_API_KEY not set; skipping the live analysis demo.");
            return Ok(());
        }
    };

    // 1. Wire up the governance layer
    let limiter = FixedWindowLimiter::new(RateLimitConfig::new());
    let cache: TtlCache<AnalysisResult> = TtlCache::new(TtlCacheConfig::new());
    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(cfg)?.with_recorder(recorder.clone());

    // 2. Admission check, keyed the way a handler would key on the caller
    let decision = limiter.check("local-demo");
    if !decision.allowed {
        eprintln!("Rate limited; try again later.");
        return Ok(());
    }

    // 3. Cache lookup by content, not by caller
    let key = derive_key(SAMPLE_RESUME, SAMPLE_JOB);
    if let Some(cached) = cache.get(&key) {
        println!("Served from cache:\n{cached:#?}");
        return Ok(());
    }

    // 4. Extract job keywords upstream
    let keyword_request = GenerateRequest::new(
        "Extract the technical skills and qualifications from this job \
         description as a JSON array of short strings.",
        SAMPLE_JOB,
    );
    let keyword_schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    let keywords = client
        .invoke(
            &keyword_request,
            &keyword_schema,
            parse_string_array,
            Vec::new(),
        )
        .await?;
    let keywords = dedupe_keywords(&keywords);
    println!("--- Job keywords ---");
    println!("{keywords:?}");

    // 5. Match them against the resume locally
    let (matched, missing) = match_keywords(SAMPLE_RESUME, &keywords);

    // 6. Ask for rewrite suggestions targeting the gaps
    let suggestion_request = GenerateRequest::new(
        "Suggest up to three resume line rewrites that honestly surface \
         the missing skills. Respond as JSON: {\"suggestions\": \
         [{\"original\": \"...\", \"suggested\": \"...\"}]}.",
        &format!(
            "Resume:\n{SAMPLE_RESUME}\n\nMissing skills: {}",
            missing.join(", ")
        ),
    );
    let suggestion_schema = json!({
        "type": "OBJECT",
        "properties": {
            "suggestions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "original": { "type": "STRING" },
                        "suggested": { "type": "STRING" }
                    },
                    "required": ["original", "suggested"]
                }
            }
        }
    });
    let suggestions = client
        .invoke(
            &suggestion_request,
            &suggestion_schema,
            parse_suggestions,
            SuggestionList::default(),
        )
        .await?;

    // 7. Assemble, cache and report
    let result = AnalysisResult::from_parts(matched, missing, suggestions.suggestions);
    cache.set(key, result.clone());

    println!("\n--- Analysis ---");
    println!("Score: {}/100", result.score);
    println!("Matched: {:?}", result.matched);
    println!("Missing: {:?}", result.missing);
    for suggestion in &result.suggestions {
        println!("\nOriginal:  {}", suggestion.original);
        println!("Suggested: {}", suggestion.suggested);
    }

    let stats = recorder.stats(None);
    println!("\nUpstream calls: {} ({} errors)", stats.calls, stats.errors);

    Ok(())
}
