use crate::core::error::ResponseParseError;
use crate::core::story::StoryDocument;

/// Removes a surrounding markdown code fence (```json or bare ```), if any.
pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s.to_string();
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    rest.trim().trim_end_matches("```").trim().to_string()
}

/// Finds the first balanced `{...}` span, skipping braces inside JSON strings.
/// If the braces never balance, falls back to the widest span from the first
/// `{` to the last `}` and lets the JSON parser report the problem.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in s[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

/// Turns raw text-model output into a story document, or fails. Never returns
/// a partially valid document.
pub fn parse_story_response(raw: &str) -> Result<StoryDocument, ResponseParseError> {
    let cleaned = strip_code_blocks(raw);
    let candidate = extract_json_object(&cleaned)
        .ok_or_else(|| ResponseParseError::new("no JSON object found", raw))?;

    let document: StoryDocument = serde_json::from_str(candidate)
        .map_err(|e| ResponseParseError::new(e.to_string(), raw))?;

    document
        .check_shape()
        .map_err(|reason| ResponseParseError::new(reason, raw))?;

    Ok(document)
}
