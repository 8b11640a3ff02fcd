use lambda_http::{http::StatusCode, Body, Error, Response};
use serde_json::json;
use thiserror::Error;

use crate::respond;

/// Failure reported by a store adapter.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Request-level failure. Every variant maps to one HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{message}")]
    Internal { message: String, detail: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        ApiError::Validation {
            message: format!("Missing required fields: {}.", fields.join(", ")),
            fields,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this error. Internal errors carry the driver detail.
    pub fn body(&self) -> serde_json::Value {
        match self {
            ApiError::Validation { message, fields } if !fields.is_empty() => {
                json!({ "message": message, "missingFields": fields })
            }
            ApiError::Internal { message, detail } => {
                json!({ "message": message, "error": detail })
            }
            other => json!({ "message": other.to_string() }),
        }
    }

    pub fn into_response(self) -> Result<Response<Body>, Error> {
        match &self {
            ApiError::Internal { detail, .. } => tracing::error!("Request failed: {}", detail),
            other => tracing::warn!("Request rejected ({}): {}", other.status(), other),
        }
        respond::json(self.status(), &self.body())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal {
            message: "Internal server error.".to_string(),
            detail: e.0,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid JSON body: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = ApiError::missing_fields(vec!["title".into(), "budget".into()]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.body(),
            json!({
                "message": "Missing required fields: title, budget.",
                "missingFields": ["title", "budget"],
            })
        );
    }

    #[test]
    fn store_failure_is_internal_with_detail() {
        let err: ApiError = StoreError("DynamoDB scan error: timeout".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body()["error"], "DynamoDB scan error: timeout");
    }

    #[test]
    fn forbidden_body_is_plain_message() {
        let err = ApiError::forbidden("You cannot bid on your own task.");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.body(), json!({ "message": "You cannot bid on your own task." }));
    }
}
