//! Extraction of a single human-readable message from backend error bodies.

use itertools::Itertools;
use serde_json::Value;

/// Pull the message out of an error response body.
///
/// Understands the `detail` envelope in its three shapes (list of `{msg}`,
/// plain string, single `{msg}` object), falling back to the stringified
/// `detail`, then the raw body, then `fallback`.
pub(crate) fn extract_message(body: &str, fallback: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        return non_empty(body).unwrap_or_else(|| fallback.to_string());
    };

    if let Some(detail) = json.get("detail") {
        return non_empty(&detail_message(detail)).unwrap_or_else(|| fallback.to_string());
    }

    match json {
        Value::String(s) if !s.trim().is_empty() => s,
        Value::String(_) | Value::Null => fallback.to_string(),
        other => other.to_string(),
    }
}

fn detail_message(detail: &Value) -> String {
    match detail {
        Value::Array(items) if items.first().and_then(|i| i.get("msg")).is_some() => items
            .iter()
            .filter_map(|item| item.get("msg"))
            .map(value_text)
            .join(", "),
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(obj) if obj.contains_key("msg") => {
            obj.get("msg").map(value_text).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(body: &str) -> Option<String> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
