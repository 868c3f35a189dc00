//! Parsers for the two response shapes orchestration requests.

use crate::analysis::SuggestionList;
use crate::{Error, Result};
use serde_json::Value;

/// Parse a JSON array of strings, skipping non-string items.
pub fn parse_string_array(text: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect()),
        other => Err(Error::parse(format!(
            "expected a JSON array of keywords, got {}",
            json_type(&other)
        ))),
    }
}

/// Parse a `{"suggestions": [...]}` object. A missing `suggestions` field
/// yields an empty list.
pub fn parse_suggestions(text: &str) -> Result<SuggestionList> {
    Ok(serde_json::from_str(text)?)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
