use crate::error::FetchError;
use crate::types::enums::ErrorType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedError {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: ErrorType,
}

impl From<NormalizedError> for FetchError {
    fn from(value: NormalizedError) -> Self {
        FetchError::Other {
            code: value.code,
            message: value.message,
            kind: Some(value.kind),
        }
    }
}

pub fn normalize(error: &FetchError) -> NormalizedError {
    match error {
        FetchError::Http { body, .. } => from_body(body),
        FetchError::Other {
            code,
            message,
            kind,
        } => NormalizedError {
            code: code.clone(),
            message: message.clone(),
            kind: kind.unwrap_or(ErrorType::General),
        },
        other => NormalizedError {
            code: other.code().to_string(),
            message: other.to_string(),
            kind: ErrorType::General,
        },
    }
}

fn from_body(body: &[u8]) -> NormalizedError {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => NormalizedError {
            code: string_field(&value, "code"),
            message: string_field(&value, "message"),
            kind: match value.get("type").and_then(Value::as_str) {
                Some("general") => ErrorType::General,
                _ => ErrorType::Api,
            },
        },
        Err(err) => NormalizedError {
            code: String::new(),
            message: err.to_string(),
            kind: ErrorType::General,
        },
    }
}

fn string_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
