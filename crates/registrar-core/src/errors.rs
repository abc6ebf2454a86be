//! Application error type shared by every layer of the Registrar API.
//!
//! Every failing operation reports one of three recoverable classes, each
//! mapped to an HTTP status so handlers can return the error directly:
//!
//! | Class        | Status | Raised when                                        |
//! |--------------|--------|----------------------------------------------------|
//! | validation   | 422    | malformed input (unknown capability, empty name, inverted dates) |
//! | not found    | 404    | the referenced id is absent from the store         |
//! | conflict     | 409    | a structural invariant forbids the operation       |
//!
//! Anything convertible into [`anyhow::Error`] (database errors, IO errors)
//! becomes an internal error through `?`.

use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::ValidationErrors;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
    /// Offending input field, set for validation failures.
    pub field: Option<String>,
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
            field: None,
        }
    }

    pub fn validation<F, E>(field: F, err: E) -> Self
    where
        F: Into<String>,
        E: Into<Error>,
    {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: err.into(),
            field: Some(field.into()),
        }
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    /// Converts `validator` derive failures into a validation error naming
    /// the first offending field (fields are visited in name order so the
    /// report is stable).
    pub fn from_validation_errors(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first() {
            Some((field, field_errors)) => {
                let message = field_errors
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", field));
                Self::validation(field.to_string(), anyhow::anyhow!(message))
            }
            None => Self::validation("body", anyhow::anyhow!("Invalid request body")),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.status == StatusCode::UNPROCESSABLE_ENTITY
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    pub fn is_conflict(&self) -> bool {
        self.status == StatusCode::CONFLICT
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} ({})", self.error, field),
            None => write!(f, "{}", self.error),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = %self.error, "Request failed with internal error");
        }

        let body = Json(ErrorResponse {
            error: self.error.to_string(),
            field: self.field,
        });

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(length(min = 1))]
        code: String,
    }

    #[test]
    fn test_constructors_map_to_status() {
        assert_eq!(
            AppError::not_found(anyhow::anyhow!("missing")).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::conflict(anyhow::anyhow!("system role")).status,
            StatusCode::CONFLICT
        );
        let err = AppError::validation("end_date", anyhow::anyhow!("inverted"));
        assert!(err.is_validation());
        assert_eq!(err.field.as_deref(), Some("end_date"));
    }

    #[test]
    fn test_from_foreign_error_is_internal() {
        let err: AppError = std::io::Error::other("disk").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.field.is_none());
    }

    #[test]
    fn test_from_validation_errors_picks_first_field() {
        let sample = Sample {
            name: String::new(),
            code: String::new(),
        };
        let err = AppError::from_validation_errors(sample.validate().unwrap_err());
        assert!(err.is_validation());
        assert_eq!(err.field.as_deref(), Some("code"));
        assert_eq!(err.error.to_string(), "code is invalid");
    }

    #[test]
    fn test_from_validation_errors_uses_message() {
        let sample = Sample {
            name: String::new(),
            code: "x".to_string(),
        };
        let err = AppError::from_validation_errors(sample.validate().unwrap_err());
        assert_eq!(err.field.as_deref(), Some("name"));
        assert_eq!(err.error.to_string(), "Name is required");
    }

    #[test]
    fn test_display_includes_field() {
        let err = AppError::validation("name", anyhow::anyhow!("Name is required"));
        assert_eq!(err.to_string(), "Name is required (name)");
    }
}
