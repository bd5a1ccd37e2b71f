//! API error bodies and user-facing message extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback message when an error body carries nothing readable.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Problem-details error body returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProblemDetails {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Either a list of `{detail, title}` entries or a field -> messages map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

impl ProblemDetails {
    /// Parse a JSON error body. Returns `None` for non-JSON or non-object bodies.
    pub fn parse(body: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(body).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Best readable message in the body, if any.
    pub fn message(&self) -> Option<String> {
        if let Some(errors) = &self.errors {
            if let Some(found) = message_from_errors(errors) {
                return Some(found);
            }
        }
        [&self.detail, &self.title, &self.message]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
    }
}

/// Extract a user-facing message from a raw error body.
///
/// Priority: first `errors[]` entry (detail, then title), first field of an
/// `errors{}` map, `detail`, `title`, `message`, then `default`.
pub fn extract_error_message(body: &str, default: &str) -> String {
    ProblemDetails::parse(body)
        .and_then(|problem| problem.message())
        .unwrap_or_else(|| default.to_string())
}

fn message_from_errors(errors: &Value) -> Option<String> {
    match errors {
        Value::Array(items) => {
            let first = items.first()?;
            ["detail", "title"]
                .iter()
                .filter_map(|key| first.get(*key).and_then(Value::as_str))
                .find(|s| !s.is_empty())
                .map(str::to_string)
        }
        Value::Object(fields) => {
            let (_, first) = fields.iter().next()?;
            match first {
                Value::Array(messages) => messages.first()?.as_str().map(str::to_string),
                Value::String(message) => Some(message.clone()),
                _ => None,
            }
        }
        _ => None,
    }
}
