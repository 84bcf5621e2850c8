//! Pulls the first JSON document out of free-form model output.

use crate::error::GenerationError;
use serde_json::Value;

/// Parses `output` as JSON, or failing that the first balanced object or
/// array inside it.
pub fn extract_json(output: &str) -> Result<Value, GenerationError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::Extraction("empty output".into()));
    }
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Ok(v);
    }
    let candidate = first_balanced(trimmed)
        .ok_or_else(|| GenerationError::Extraction("no JSON object or array found".into()))?;
    serde_json::from_str(candidate).map_err(|e| {
        GenerationError::Extraction(format!("failed to parse extracted JSON: {e}"))
    })
}

fn first_balanced(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(start, _)| matching_close(text, start).map(|end| &text[start..=end]))
}

/// Byte index of the bracket closing the one at `start`. String literals and
/// escapes are skipped.
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    for (i, ch) in text[start..].char_indices() {
        if in_string {
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                let open = stack.pop()?;
                if (open == '{') != (ch == '}') {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}
