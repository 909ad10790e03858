//! Code-fence stripping for LLM output.
//!
//! Models regularly wrap JSON in triple-backtick fences, with or without a
//! language tag on the first line. Every generator goes through this one
//! utility instead of re-implementing the strip inline.

use serde_json::Value;

/// Strip a leading/trailing triple-backtick fence if present.
///
/// Idempotent: an already-unwrapped response comes back unchanged (modulo
/// surrounding whitespace).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the rest of the fence line (possibly a language tag like "json").
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Recover a JSON value from raw LLM text.
///
/// Tries the fence-stripped text first, then falls back to the outermost
/// brace span in case the model wrapped the JSON in prose. Returns None when
/// nothing parses; callers degrade to their documented fallback shape.
pub fn parse_json_response(text: &str) -> Option<Value> {
    let stripped = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(stripped) {
        return Some(value);
    }

    // Prose around the payload: take the outermost {...} or [...] span.
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (stripped.find(open), stripped.rfind(close)) {
            if start < end {
                if let Ok(value) = serde_json::from_str::<Value>(&stripped[start..=end]) {
                    return Some(value);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fence_with_language_tag() {
        let wrapped = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(wrapped), "{\"a\": 1}");
    }

    #[test]
    fn strips_fence_without_language_tag() {
        let wrapped = "```\n[1, 2]\n```";
        assert_eq!(strip_code_fences(wrapped), "[1, 2]");
    }

    #[test]
    fn unfenced_text_unchanged() {
        assert_eq!(strip_code_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn stripping_is_idempotent() {
        let wrapped = "```json\n{\"smart_goals\": []}\n```";
        let once = strip_code_fences(wrapped);
        assert_eq!(strip_code_fences(once), once);
    }

    #[test]
    fn fenced_and_unfenced_parse_identically() {
        let fenced = parse_json_response("```json\n{\"day\": 1}\n```").unwrap();
        let plain = parse_json_response("{\"day\": 1}").unwrap();
        assert_eq!(fenced, plain);
    }

    #[test]
    fn recovers_json_wrapped_in_prose() {
        let text = "Here is your plan:\n{\"upcoming\": {\"today\": []}}\nHope that helps!";
        let value = parse_json_response(text).unwrap();
        assert_eq!(value, json!({"upcoming": {"today": []}}));
    }

    #[test]
    fn garbage_yields_none() {
        assert!(parse_json_response("I could not produce a schedule.").is_none());
        assert!(parse_json_response("").is_none());
    }
}
