//! Turns a free-form model answer into a total verdict
//!
//! The answer is expected to contain a JSON object, but nothing about its
//! shape is trusted: the object is located leniently, every field is coerced
//! individually, and anything missing or unusable takes its default.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::warn;

use crate::classifier::{AnalysisVerdict, ScanResult, UnparsedResponse};

/// Summary recorded when the answer has no parseable JSON object
pub const PARSE_FAILED_SUMMARY: &str = "parse failed";

const DEFAULT_SCORE: u8 = 5;
const DEFAULT_SAFETY_SCORE: u8 = 8;
const DEFAULT_LANGUAGE: &str = "unknown";
const DEFAULT_SUMMARY: &str = "Analysis completed";

/// Parse a raw answer into a verdict, or a fallback carrying the raw text
pub fn parse_response(raw: &str, model: &str, analyzed_at: DateTime<Utc>) -> ScanResult {
    match find_json_object(raw) {
        Some(object) => ScanResult::Verdict(verdict_from_object(&object, model, analyzed_at)),
        None => {
            warn!("Could not parse AI response ({} chars)", raw.len());
            ScanResult::Unparsed(UnparsedResponse {
                summary: PARSE_FAILED_SUMMARY.to_string(),
                raw_response: raw.to_string(),
                analyzed_at,
            })
        }
    }
}

/// Build a verdict from a parsed object, defaulting every unusable field
pub fn verdict_from_object(
    object: &Map<String, Value>,
    model: &str,
    analyzed_at: DateTime<Utc>,
) -> AnalysisVerdict {
    AnalysisVerdict {
        content_quality: score(object, "content_quality", DEFAULT_SCORE),
        description_accuracy: score(object, "description_accuracy", DEFAULT_SCORE),
        safety_score: score(object, "safety_score", DEFAULT_SAFETY_SCORE),
        category_match: score(object, "category_match", DEFAULT_SCORE),
        is_malicious: flag(object, "is_malicious", false),
        is_adult_content: flag(object, "is_adult_content", false),
        language: text(object, "language", DEFAULT_LANGUAGE),
        recommendations: list(object, "recommendations"),
        red_flags: list(object, "red_flags"),
        summary: text(object, "summary", DEFAULT_SUMMARY),
        analyzed_at,
        ai_model: model.to_string(),
    }
}

/// Locate a JSON object in the answer
///
/// Tries the whole answer, then the inside of a Markdown code fence, then
/// the span between the first `{` and the last `}`.
fn find_json_object(raw: &str) -> Option<Map<String, Value>> {
    let trimmed = raw.trim();
    let unfenced = strip_code_fence(trimmed);
    let braced = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => "",
    };

    [trimmed, unfenced, braced]
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => Some(object),
            _ => None,
        })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an info string such as `json` on the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn score(object: &Map<String, Value>, key: &str, default: u8) -> u8 {
    let value = match object.get(key) {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(1.0, 10.0) as u8)
        .unwrap_or(default)
}

fn flag(object: &Map<String, Value>, key: &str, default: bool) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(default, |v| v != 0.0),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => true,
            "false" | "no" | "0" => false,
            _ => default,
        },
        _ => default,
    }
}

fn text(object: &Map<String, Value>, key: &str, default: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => default.to_string(),
    }
}

fn list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}
