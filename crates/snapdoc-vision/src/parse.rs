//! Best-effort structured parsing of free-text model output.
//!
//! Models asked for "JSON only" still wrap their answer in prose or
//! markdown fences often enough that a strict parse alone is useless.
//! The ladder here tries progressively looser extractions and bottoms
//! out in a degraded variant carrying the raw text - it never fails.

use serde_json::Value;

/// Outcome of parsing a model response.
///
/// Callers pattern-match: `Parsed` carries a JSON value, `Degraded`
/// carries the raw text for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedResponse {
    Parsed(Value),
    Degraded { raw: String },
}

/// Parse a model response into JSON, trying in order:
/// 1. the whole text as strict JSON;
/// 2. the contents of the first fenced code block;
/// 3. the first top-level `{...}` brace span;
/// 4. give up and keep the raw text.
pub fn parse_model_json(raw: &str) -> ParsedResponse {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return ParsedResponse::Parsed(value);
    }

    if let Some(fenced) = extract_fenced_block(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(fenced) {
            return ParsedResponse::Parsed(value);
        }
    }

    if let Some(span) = extract_brace_span(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return ParsedResponse::Parsed(value);
        }
    }

    ParsedResponse::Degraded {
        raw: raw.to_string(),
    }
}

/// Contents of the first ``` fenced block, with an optional `json`
/// language tag stripped.
fn extract_fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let body = raw[start + 3..].trim_start_matches("json").trim_start();
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// The span from the first `{` to the last `}`, when both exist.
fn extract_brace_span(raw: &str) -> Option<&str> {
    let first = raw.find('{')?;
    let last = raw.rfind('}')?;
    if last > first {
        Some(&raw[first..=last])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_json_parses_directly() {
        let parsed = parse_model_json(r#"{"found": true, "regions": []}"#);
        assert_eq!(parsed, ParsedResponse::Parsed(json!({"found": true, "regions": []})));
    }

    #[test]
    fn test_fenced_block_extracted() {
        let raw = "Here you go:\n```json\n{\"found\": false}\n```\nLet me know!";
        assert_eq!(
            parse_model_json(raw),
            ParsedResponse::Parsed(json!({"found": false}))
        );
    }

    #[test]
    fn test_fenced_block_without_language_tag() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(parse_model_json(raw), ParsedResponse::Parsed(json!({"a": 1})));
    }

    #[test]
    fn test_brace_span_extracted_from_prose() {
        let raw = "The answer is {\"confidence\": 0.8} as requested.";
        assert_eq!(
            parse_model_json(raw),
            ParsedResponse::Parsed(json!({"confidence": 0.8}))
        );
    }

    #[test]
    fn test_total_failure_degrades_with_raw_text() {
        let raw = "I'm sorry, I can't find any chart on this screen.";
        match parse_model_json(raw) {
            ParsedResponse::Degraded { raw: kept } => assert_eq!(kept, raw),
            other => panic!("expected degraded, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_braces_degrade() {
        let raw = "} backwards {";
        assert!(matches!(
            parse_model_json(raw),
            ParsedResponse::Degraded { .. }
        ));
    }
}
