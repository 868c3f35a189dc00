//! Per-call request parameters.

use std::time::Duration;

/// Default attempt budget per invocation.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One logical generation call: prompts plus its retry and timeout budget.
///
/// Immutable once built; the client never mutates it. `max_retries` is the
/// total number of sequential attempts, not extra retries after the first.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system_prompt: String,
    pub user_text: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl GenerateRequest {
    pub fn new(system_prompt: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_text: user_text.into(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the total attempt budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
