//! Error types for frest.
//!
//! Defines a unified error type that maps cleanly to HTTP responses.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::validation::ValidationErrors;

/// Unified error type for frest operations.
#[derive(Debug, Error)]
pub enum FrestError {
    /// The request payload did not satisfy the declared schema.
    #[error("Request validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Failed to read request body: {0}")]
    Body(#[from] BytesRejection),

    #[error("Unknown field '{field}' on schema '{schema}'")]
    UnknownField { schema: String, field: String },

    #[error("Schema '{0}' does not serialize to a mapping")]
    NotAMapping(String),

    #[error("Invalid schema '{name}': {reason}")]
    Schema { name: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ValidationErrors> for FrestError {
    fn from(errors: ValidationErrors) -> Self {
        FrestError::Validation(errors)
    }
}

/// Error response body for API clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for FrestError {
    fn into_response(self) -> Response {
        let (code, details) = match self {
            // Validation failures are answered with the bare record list.
            FrestError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            FrestError::Body(rejection) => return rejection.into_response(),
            FrestError::UnknownField { ref schema, ref field } => {
                tracing::error!(%schema, %field, "Projection on unknown field");
                ("UNKNOWN_FIELD", None)
            }
            FrestError::NotAMapping(ref schema) => {
                tracing::error!(%schema, "Schema instance is not a mapping");
                ("NOT_A_MAPPING", None)
            }
            FrestError::Schema { ref name, ref reason } => {
                tracing::error!(schema = %name, %reason, "Schema could not be compiled");
                ("SCHEMA_ERROR", None)
            }
            FrestError::Serialization(ref e) => {
                tracing::error!(error = %e, "Response serialization failed");
                ("SERIALIZATION_ERROR", Some(e.to_string()))
            }
        };

        let body = ErrorResponse {
            error: "An internal error occurred".to_string(),
            code: code.to_string(),
            details,
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

/// Result type alias for frest operations.
pub type FrestResult<T> = Result<T, FrestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ErrorRecord;

    #[test]
    fn test_validation_error_is_bad_request() {
        let errors = ValidationErrors::from(vec![ErrorRecord::missing("name")]);
        let response = FrestError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_projection_error_is_internal() {
        let err = FrestError::UnknownField {
            schema: "Person".to_string(),
            field: "height".to_string(),
        };
        assert!(err.to_string().contains("height"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
