//! Utilities for extracting JSON from model responses.
//!
//! Model responses often contain JSON wrapped in markdown code blocks or
//! mixed with explanatory prose. These helpers find the payload, parse it,
//! and report failures as [`MalformedOutputError`]s.

use novelweave_error::{MalformedOutputError, MalformedOutputErrorKind, NovelweaveResult};
use serde_json::Value;

/// Characters of the offending text kept in parse error previews.
const PREVIEW_CHARS: usize = 200;

/// Extract JSON from a response that may contain markdown or extra text.
///
/// This function tries multiple extraction strategies:
/// 1. Markdown code blocks: ```json ... ``` then bare fences
/// 2. Whichever of balanced `{ ... }` or `[ ... ]` starts first
///
/// A fence without its closing marker yields everything after the opening
/// fence, so truncated responses still reach the parser.
///
/// # Errors
///
/// Returns [`MalformedOutputErrorKind::NoJson`] if nothing JSON-like is found.
///
/// # Examples
///
/// ```
/// use novelweave_pipeline::extract_json;
///
/// let response = "Here is the outline:\n\
///     \n\
///     ```json\n\
///     {\"title\": \"雨夜\"}\n\
///     ```\n";
///
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("雨夜"));
/// ```
pub fn extract_json(response: &str) -> NovelweaveResult<String> {
    json_candidates(response)
        .into_iter()
        .next()
        .ok_or_else(|| no_json(response))
}

/// Every JSON-looking slice of `response`, in the order they should be tried.
///
/// A fenced block comes first, then balanced `[ ... ]` / `{ ... }` slices
/// (whichever delimiter opens first leads), then the span from the first `{`
/// to the last `}` of the whole response.
fn json_candidates(response: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(json) = extract_from_code_block(response, "json") {
        candidates.push(json);
    }

    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    let order: [(char, char); 2] = match (bracket_pos, brace_pos) {
        (Some(b), Some(c)) if b < c => [('[', ']'), ('{', '}')],
        (Some(_), None) => [('[', ']'), ('{', '}')],
        _ => [('{', '}'), ('[', ']')],
    };

    for (open, close) in order {
        if let Some(json) = extract_balanced(response, open, close) {
            candidates.push(json);
        }
    }

    if let (Some(start), Some(end)) = (brace_pos, response.rfind('}')) {
        if start < end {
            candidates.push(response[start..=end].to_string());
        }
    }

    candidates.dedup();
    candidates
}

fn no_json(response: &str) -> novelweave_error::NovelweaveError {
    tracing::error!(
        response_length = response.len(),
        preview = %preview(response),
        "No JSON found in model response"
    );

    MalformedOutputError::new(MalformedOutputErrorKind::NoJson {
        response_length: response.len(),
    })
    .into()
}

/// Extract content from markdown code blocks.
///
/// Looks for patterns like:
/// - ```language\n...\n```
/// - ``` ... ``` (no language specified)
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    if let Some(start) = response.find(&pattern) {
        let content_start = start + pattern.len();
        return Some(until_fence(&response[content_start..]));
    }

    let start = response.find("```")?;
    let content_start = start + 3;
    // Skip a language tag on the fence line
    let skip_to = response[content_start..]
        .find('\n')
        .map(|n| content_start + n + 1)
        .unwrap_or(content_start);

    Some(until_fence(&response[skip_to..]))
}

fn until_fence(content: &str) -> String {
    match content.find("```") {
        Some(end) => content[..end].trim().to_string(),
        None => content.trim().to_string(),
    }
}

/// Extract content between balanced delimiters.
///
/// Finds the first occurrence of `open` and extracts content up to
/// the matching `close`, ignoring delimiters inside string literals.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(response[start..start + i + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse extracted text into a JSON value.
///
/// If the text does not parse as a whole, the slice from the first `{` to
/// the last `}` is tried before giving up.
///
/// # Errors
///
/// Returns [`MalformedOutputErrorKind::InvalidJson`] with a short preview.
pub fn parse_json_value(text: &str) -> NovelweaveResult<Value> {
    let first_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                tracing::debug!("Recovered JSON from outermost object");
                return Ok(value);
            }
        }
    }

    let preview = preview(text);
    tracing::error!(
        error = %first_error,
        json_preview = %preview,
        "JSON parsing failed"
    );

    Err(MalformedOutputError::new(MalformedOutputErrorKind::InvalidJson {
        message: first_error.to_string(),
        preview,
    })
    .into())
}

/// Whether a response looks cut off before its JSON closed.
pub fn looks_truncated(response: &str) -> bool {
    let trimmed = response.trim_end();
    !(trimmed.ends_with('}') || trimmed.ends_with(']') || trimmed.ends_with("```"))
}

/// Extract and parse the JSON payload of a raw model response.
///
/// Candidates are tried in turn, so a stray bracket in leading prose does
/// not hide the payload that follows it.
///
/// # Errors
///
/// Returns a malformed-output error if no JSON is found or it does not parse.
pub fn parse_response(response: &str) -> NovelweaveResult<Value> {
    if looks_truncated(response) {
        tracing::warn!(
            response_length = response.len(),
            "Response may be truncated; consider raising max_tokens"
        );
    }
    let mut first_error = None;
    for candidate in json_candidates(response) {
        match parse_json_value(&candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::debug!(error = %e, "Candidate rejected, trying next");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    Err(first_error.unwrap_or_else(|| no_json(response)))
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelweave_error::NovelweaveErrorKind;

    fn malformed_kind(err: novelweave_error::NovelweaveError) -> MalformedOutputErrorKind {
        match err.kind() {
            NovelweaveErrorKind::MalformedOutput(e) => e.kind.clone(),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_extract_json_from_code_block() {
        let response = r#"
Here's the JSON you requested:

```json
{
  "title": "雨夜",
  "beats": []
}
```

Hope this helps!
"#;
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.contains("\"title\": \"雨夜\""));
    }

    #[test]
    fn test_extract_json_from_bare_fence() {
        let response = "```\n[{\"id\": \"local_1\"}]\n```";
        assert_eq!(extract_json(response).unwrap(), "[{\"id\": \"local_1\"}]");
    }

    #[test]
    fn test_extract_json_from_truncated_fence() {
        let response = "```json\n{\"nodes\": [{\"id\": \"n1\"";
        let json = extract_json(response).unwrap();
        assert_eq!(json, "{\"nodes\": [{\"id\": \"n1\"");
    }

    #[test]
    fn test_extract_json_balanced_braces() {
        let response = r#"Sure! Here it is: {"id": 456, "nested": {"value": "test"}} Enjoy."#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"id": 456, "nested": {"value": "test"}}"#);
    }

    #[test]
    fn test_extract_json_array_first() {
        let response = r#"
Here are the nodes:
[
  {"id": "n1"},
  {"id": "n2"}
]
"#;
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('['));
        assert!(json.ends_with(']'));
    }

    #[test]
    fn test_extract_json_ignores_braces_in_strings() {
        let response = r#"{"text": "她说 \"}\" 然后离开了"} trailing"#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, r#"{"text": "她说 \"}\" 然后离开了"}"#);
    }

    #[test]
    fn test_no_json_found() {
        let err = extract_json("This is just plain text with no JSON").unwrap_err();
        assert!(matches!(
            malformed_kind(err),
            MalformedOutputErrorKind::NoJson { response_length: 36 }
        ));
    }

    #[test]
    fn test_parse_json_value_falls_back_to_outer_object() {
        let value = parse_json_value("note: {\"title\": \"x\"} end").unwrap();
        assert_eq!(value["title"], "x");
    }

    #[test]
    fn test_parse_json_value_reports_preview() {
        let err = parse_json_value("{\"title\": ").unwrap_err();
        match malformed_kind(err) {
            MalformedOutputErrorKind::InvalidJson { preview, .. } => {
                assert_eq!(preview, "{\"title\": ");
            }
            other => panic!("unexpected kind: {}", other),
        }
    }

    #[test]
    fn test_looks_truncated() {
        assert!(!looks_truncated("{\"a\": 1}\n"));
        assert!(!looks_truncated("```json\n[]\n```"));
        assert!(looks_truncated("{\"a\": [1, 2"));
    }

    #[test]
    fn test_parse_response_skips_bracketed_prose() {
        let value = parse_response("Sure [note]: {\"title\": \"x\", \"beats\": []}").unwrap();
        assert_eq!(value["title"], "x");
        assert!(value["beats"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_moves_past_unparseable_fence() {
        let value = parse_response("```\nnot json\n```\n{\"nodes\": []}").unwrap();
        assert!(value["nodes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_response_reports_first_failure() {
        let err = parse_response("[oops] and {broken").unwrap_err();
        assert!(matches!(
            malformed_kind(err),
            MalformedOutputErrorKind::InvalidJson { .. }
        ));
    }

    #[test]
    fn test_parse_response_end_to_end() {
        let value = parse_response("好的：\n```json\n{\"nodes\": []}\n```").unwrap();
        assert!(value["nodes"].as_array().unwrap().is_empty());
    }
}
