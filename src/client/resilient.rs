//! Resilient invocation of the generative endpoint.

use super::backoff::{rate_limit_backoff, transient_backoff, EMPTY_RETRY_DELAY};
use super::config::GeminiConfig;
use super::request::GenerateRequest;
use crate::telemetry::EventRecorder;
use crate::{Error, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Classification of one finished attempt.
#[derive(Debug)]
enum AttemptOutcome {
    /// 2xx with generated text present.
    Success(String),
    /// 2xx but no usable text in the envelope.
    EmptyRetry,
    /// HTTP 429 from the upstream.
    RateLimitRetry,
    /// Network failure or attempt timeout, with the reason.
    TransientRetry(String),
    /// Any other non-2xx status. Aborts the invocation.
    HardFail { status: u16, message: String },
}

impl AttemptOutcome {
    fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::EmptyRetry => "empty_response",
            AttemptOutcome::RateLimitRetry => "rate_limited",
            AttemptOutcome::TransientRetry(_) => "transient",
            AttemptOutcome::HardFail { .. } => "hard_failure",
        }
    }
}

/// Client for the generative endpoint with retry, backoff, per-attempt
/// timeout, and parse-fallback built in.
///
/// An invocation only ever errors on a hard upstream failure (a non-2xx
/// status other than 429). Every other degraded path - exhausted retries
/// after 429s, network failures, timeouts, empty responses, or a response
/// the parser rejects - resolves to the caller's fallback value.
pub struct GeminiClient {
    http: reqwest::Client,
    cfg: GeminiConfig,
    recorder: Option<Arc<EventRecorder>>,
}

impl GeminiClient {
    pub fn new(cfg: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            cfg,
            recorder: None,
        })
    }

    /// Attach a recorder; every attempt then emits one call event.
    pub fn with_recorder(mut self, recorder: Arc<EventRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.cfg
    }

    /// Run one logical generation call, up to `request.max_retries` attempts.
    ///
    /// 429 and transport failures back off exponentially and retry; an empty
    /// response retries after a short fixed pause. When the attempt budget
    /// runs out on any retryable path, `fallback` comes back instead of an
    /// error, as it does when the parser rejects an otherwise-successful
    /// response.
    pub async fn invoke<T, P>(
        &self,
        request: &GenerateRequest,
        response_schema: &Value,
        parser: P,
        fallback: T,
    ) -> Result<T>
    where
        P: Fn(&str) -> Result<T>,
    {
        let invocation_id = Uuid::new_v4().to_string();
        let payload = build_payload(request, response_schema, self.cfg.temperature);
        let url = format!(
            "{}/models/{}:generateContent",
            self.cfg.base_url, self.cfg.model
        );

        for attempt in 1..=request.max_retries {
            let started = Instant::now();
            let outcome = self.attempt(&url, &payload, request.timeout).await;
            self.record_attempt(&outcome, started.elapsed());
            debug!(
                invocation_id = %invocation_id,
                attempt,
                outcome = outcome.label(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "attempt finished"
            );

            let attempts_remain = attempt < request.max_retries;
            match outcome {
                AttemptOutcome::Success(text) => {
                    return Ok(match parser(&text) {
                        Ok(parsed) => parsed,
                        Err(err) => {
                            warn!(
                                invocation_id = %invocation_id,
                                error = %err,
                                "parser rejected response, using fallback"
                            );
                            fallback
                        }
                    });
                }
                AttemptOutcome::HardFail { status, message } => {
                    warn!(invocation_id = %invocation_id, status, "upstream hard failure");
                    return Err(Error::upstream(status, message));
                }
                AttemptOutcome::EmptyRetry if attempts_remain => {
                    warn!(invocation_id = %invocation_id, attempt, "empty response, retrying");
                    tokio::time::sleep(EMPTY_RETRY_DELAY).await;
                }
                AttemptOutcome::RateLimitRetry if attempts_remain => {
                    let delay = rate_limit_backoff(attempt);
                    warn!(
                        invocation_id = %invocation_id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "upstream rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                AttemptOutcome::TransientRetry(reason) if attempts_remain => {
                    let delay = transient_backoff(attempt);
                    warn!(
                        invocation_id = %invocation_id,
                        attempt,
                        reason = %reason,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                // Budget exhausted on a retryable path.
                _ => break,
            }
        }

        debug!(invocation_id = %invocation_id, "attempts exhausted, returning fallback");
        Ok(fallback)
    }

    /// One network attempt under its own timeout. The timeout cancels only
    /// this attempt's request future.
    async fn attempt(&self, url: &str, payload: &Value, timeout: Duration) -> AttemptOutcome {
        let call = async {
            let response = self
                .http
                .post(url)
                .query(&[("key", self.cfg.api_key.as_str())])
                .json(payload)
                .send()
                .await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<(u16, String), reqwest::Error>((status, body))
        };

        match tokio::time::timeout(timeout, call).await {
            Err(_) => AttemptOutcome::TransientRetry("attempt timed out".to_string()),
            Ok(Err(err)) => AttemptOutcome::TransientRetry(err.to_string()),
            Ok(Ok((status, body))) => classify_response(status, &body),
        }
    }

    fn record_attempt(&self, outcome: &AttemptOutcome, elapsed: Duration) {
        if let Some(recorder) = &self.recorder {
            let success = matches!(outcome, AttemptOutcome::Success(_));
            let error = if success { None } else { Some(outcome.label()) };
            recorder.track_call("gemini.generate", elapsed, success, error);
        }
    }
}

/// Assemble the generateContent payload: user content, system instruction,
/// and a structured-output config pinned to JSON at low temperature.
fn build_payload(request: &GenerateRequest, response_schema: &Value, temperature: f64) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": request.user_text }] }],
        "systemInstruction": { "parts": [{ "text": request.system_prompt }] },
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema,
            "temperature": temperature,
        },
    })
}

fn classify_response(status: u16, body: &str) -> AttemptOutcome {
    if status == 429 {
        return AttemptOutcome::RateLimitRetry;
    }
    if !(200..300).contains(&status) {
        return AttemptOutcome::HardFail {
            status,
            message: body.to_string(),
        };
    }
    match extract_text(body) {
        Some(text) => AttemptOutcome::Success(text),
        None => AttemptOutcome::EmptyRetry,
    }
}

/// Pull the generated text out of the response envelope. A malformed
/// envelope or blank text means the attempt produced nothing usable.
fn extract_text(body: &str) -> Option<String> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    let text = envelope["candidates"][0]["content"]["parts"][0]["text"].as_str()?;
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
