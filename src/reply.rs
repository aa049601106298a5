//! Turning a model's free-text reply into a typed value.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```$").expect("Invalid regex pattern")
    })
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    match fence_regex().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

/// Parse a JSON reply into `T`. The error string is suitable for a failure reason.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, String> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return Err("reply is empty".to_string());
    }
    serde_json::from_str(body).map_err(|e| format!("reply is not valid JSON for the expected shape: {}", e))
}
