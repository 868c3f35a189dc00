//! Content-addressed key derivation.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// ASCII control characters that never carry meaning in pasted text.
/// Tabs and newlines survive; CR is left for the CRLF fold.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

/// Normalize pasted text before hashing or matching: strip control
/// characters, fold CRLF to LF, trim surrounding whitespace.
pub fn normalize_text(text: &str) -> String {
    CONTROL_CHARS
        .replace_all(text, "")
        .replace("\r\n", "\n")
        .trim()
        .to_string()
}

/// Derive the cache key for a (resume, job description) pair.
///
/// SHA-256 over the normalized texts with each field length-prefixed, so
/// `("ab", "c")` can never collide with `("a", "bc")`. Identical content
/// yields the same key regardless of requester, and the raw text itself is
/// never used as a key.
pub fn derive_key(resume_text: &str, job_desc_text: &str) -> String {
    let mut hasher = Sha256::new();
    for field in [normalize_text(resume_text), normalize_text(job_desc_text)] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
