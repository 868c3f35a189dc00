use thiserror::Error;

/// Unified error type for the governance core.
///
/// Only [`Error::Upstream`] ever crosses the invocation boundary of the
/// resilient client; every other degraded condition inside an invocation
/// resolves to the caller's fallback value. The remaining variants surface
/// from construction and from using the parsers or the transport directly.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Non-2xx upstream status other than 429. Non-retryable.
    #[error("Upstream error: HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Network transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Response parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a new upstream error from a status code and response body
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Error::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// True for the one variant that aborts an invocation outright.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Upstream { .. })
    }
}
