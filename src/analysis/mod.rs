//! Analysis result types and keyword matching.
//!
//! The value shape stored in the result cache, plus the pure helpers that
//! turn an extracted keyword list into matched/missing sets and a 0-100
//! score. Matching is whole-word and case-insensitive against the raw
//! resume text.

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// round(matched / max(total, 1) x 100)
pub fn match_score(matched_count: usize, total: usize) -> u8 {
    let total = total.max(1);
    ((matched_count as f64 / total as f64) * 100.0).round() as u8
}

/// One phrasing improvement proposed by the upstream model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub original: String,
    pub suggested: String,
}

/// Wire shape of the suggestion-generation response. A response without a
/// `suggestions` field deserializes to an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionList {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// The cached result of one analysis: keyword coverage plus suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0-100 share of job keywords found in the resume.
    pub score: u8,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub suggestions: Vec<Suggestion>,
}

impl AnalysisResult {
    /// Assemble a result, computing the score from the keyword split.
    pub fn from_parts(
        matched: Vec<String>,
        missing: Vec<String>,
        suggestions: Vec<Suggestion>,
    ) -> Self {
        let score = match_score(matched.len(), matched.len() + missing.len());
        Self {
            score,
            matched,
            missing,
            suggestions,
        }
    }
}

/// Lowercase, trim, and drop duplicates, keeping first-occurrence order.
pub fn dedupe_keywords(keywords: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        if seen.insert(keyword.clone()) {
            unique.push(keyword);
        }
    }
    unique
}

/// Split keywords into (matched, missing) against the resume text,
/// preserving input order on both sides.
pub fn match_keywords(resume_text: &str, keywords: &[String]) -> (Vec<String>, Vec<String>) {
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for keyword in keywords {
        if keyword_present(resume_text, keyword) {
            matched.push(keyword.clone());
        } else {
            missing.push(keyword.clone());
        }
    }
    (matched, missing)
}

/// Whole-word, case-insensitive containment. A trailing non-word character
/// defeats the closing `\b` (e.g. `c++`), so such keywords count as missing.
fn keyword_present(text: &str, keyword: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(keyword));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
