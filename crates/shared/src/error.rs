use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            429 => Self::RateLimited,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiException {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Validation failure body returned by the registration API, e.g.
/// `{"non_field_errors": ["Discount is not currently available."]}` or
/// `{"discount_code": ["This field is required."]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationErrors {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_field_errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ValidationErrors {
    pub fn first_message(&self) -> Option<String> {
        if let Some(message) = self.non_field_errors.first() {
            return Some(message.clone());
        }
        if let Some(detail) = &self.detail {
            return Some(detail.clone());
        }
        self.fields.iter().find_map(|(field, value)| match value {
            serde_json::Value::String(message) => Some(format!("{field}: {message}")),
            serde_json::Value::Array(messages) => messages
                .iter()
                .find_map(|message| message.as_str())
                .map(|message| format!("{field}: {message}")),
            _ => None,
        })
    }
}
