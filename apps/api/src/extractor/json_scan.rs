//! Locates JSON embedded in free-text oracle replies.

use serde::de::DeserializeOwned;

/// Which kind of top-level JSON value to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    fn brackets(self) -> (u8, u8) {
        match self {
            Shape::Object => (b'{', b'}'),
            Shape::Array => (b'[', b']'),
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Returns every balanced `{...}` or `[...]` substring, in order of their opening bracket.
///
/// The scan tracks string literals and escapes once inside a candidate, so
/// brackets inside JSON strings do not affect depth. Text before the opening
/// bracket is never interpreted.
pub fn balanced_candidates(text: &str, shape: Shape) -> Vec<&str> {
    let (open, close) = shape.brackets();
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = bytes[search_from..].iter().position(|&b| b == open) {
        let start = search_from + offset;
        match scan_from(bytes, start, open, close) {
            Some(end) => {
                found.push(&text[start..=end]);
                search_from = end + 1;
            }
            None => search_from = start + 1,
        }
    }

    found
}

/// Returns the index of the bracket closing the one at `start`, if any.
fn scan_from(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &byte) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

/// Decodes the first embedded JSON value of the given shape that deserializes as `T`.
///
/// Returns a human-readable reason when nothing usable is found.
pub fn decode_embedded<T: DeserializeOwned>(reply: &str, shape: Shape) -> Result<T, String> {
    let text = strip_json_fences(reply);
    let candidates = balanced_candidates(text, shape);
    if candidates.is_empty() {
        return Err(match shape {
            Shape::Object => "reply contains no JSON object".to_string(),
            Shape::Array => "reply contains no JSON array".to_string(),
        });
    }

    let mut last_error = String::new();
    for candidate in candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(format!("embedded JSON could not be decoded: {last_error}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_object_embedded_in_prose() {
        let reply = "Great, thanks! Here you go: {\"a\": {\"b\": 1}} Let me know.";
        assert_eq!(
            balanced_candidates(reply, Shape::Object),
            vec!["{\"a\": {\"b\": 1}}"]
        );
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let reply = r#"[{"question": "What does ] mean in a slice?", "hint": "[a..b]"}]"#;
        let found = balanced_candidates(reply, Shape::Array);
        assert_eq!(found, vec![reply]);
    }

    #[test]
    fn test_unbalanced_reply_has_no_candidates() {
        assert!(balanced_candidates("{\"name\": \"Jane\"", Shape::Object).is_empty());
        assert!(balanced_candidates("no json at all", Shape::Array).is_empty());
    }

    #[test]
    fn test_decode_skips_undecodable_candidate() {
        let reply = "Use {placeholders} like this: {\"ok\": true}";
        let value: Value = decode_embedded(reply, Shape::Object).unwrap();
        assert_eq!(value["ok"], Value::Bool(true));
    }

    #[test]
    fn test_decode_without_brackets_reports_reason() {
        let err = decode_embedded::<Value>("Could you share your email?", Shape::Object)
            .unwrap_err();
        assert!(err.contains("no JSON object"));
    }

    #[test]
    fn test_decode_fenced_array() {
        let reply = "```json\n[1, 2, 3]\n```";
        let value: Vec<u32> = decode_embedded(reply, Shape::Array).unwrap();
        assert_eq!(value, vec![1, 2, 3]);
    }
}
