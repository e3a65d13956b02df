//! Pulling the analysis object out of model replies.
//!
//! Replies often wrap the JSON in a markdown fence or surround it with prose.

use quarry_core::NluAnalysis;
use quarry_error::{NluError, NluErrorKind, QuarryResult};
use serde_json::{Map, Value};

/// Extract a JSON object from a reply that may contain markdown or extra text.
///
/// Tries a fenced code block first, then the first balanced `{ ... }`.
///
/// # Errors
///
/// Returns an NLU parse error if no object is found.
///
/// # Examples
///
/// ```
/// use quarry_nlp::extract_json_object;
///
/// let reply = "Sure:\n```json\n{\"data_entity\": \"users\"}\n```\n";
/// let json = extract_json_object(reply).unwrap();
/// assert!(json.starts_with('{'));
/// ```
pub fn extract_json_object(response: &str) -> QuarryResult<String> {
    if let Some(block) = extract_from_code_block(response)
        && let Some(json) = extract_balanced(&block, '{', '}')
    {
        return Ok(json);
    }

    if let Some(json) = extract_balanced(response, '{', '}') {
        return Ok(json);
    }

    Err(NluError::new(NluErrorKind::Parse(format!(
        "No JSON object found in response (length: {})",
        response.len()
    )))
    .into())
}

/// Parse a model reply into an [`NluAnalysis`].
///
/// Non-string values are kept as their JSON text; empty strings, empty
/// collections and nulls count as absent.
///
/// # Errors
///
/// Returns an NLU parse error if the reply holds no JSON object.
pub fn parse_analysis(response: &str) -> QuarryResult<NluAnalysis> {
    let json = extract_json_object(response)?;
    let map: Map<String, Value> = serde_json::from_str(&json).map_err(|e| {
        let preview = json.chars().take(100).collect::<String>();
        tracing::warn!(error = %e, json_preview = %preview, "Analysis JSON parsing failed");
        NluError::new(NluErrorKind::Parse(format!("Failed to parse JSON: {}", e)))
    })?;

    Ok(NluAnalysis {
        data_entity: text_field(&map, "data_entity"),
        query_type: text_field(&map, "query_type"),
        conditions: text_field(&map, "conditions"),
        aggregations: text_field(&map, "aggregations"),
        time_range: text_field(&map, "time_range"),
        output_requirements: text_field(&map, "output_requirements"),
        description: text_field(&map, "description"),
        fallback: false,
    })
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Content of the first markdown code block, with or without a language tag.
fn extract_from_code_block(response: &str) -> Option<String> {
    let start = response.find("```")?;
    let content_start = start + 3;
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    match response[skip_to..].find("```") {
        Some(end) => Some(response[skip_to..skip_to + end].trim().to_string()),
        // Truncated reply: take everything after the fence
        None => Some(response[skip_to..].trim().to_string()),
    }
}

/// Content between the first `open` and its matching `close`, string-aware.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + c.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}
