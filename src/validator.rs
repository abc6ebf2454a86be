use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use registrar_core::AppError;

/// Pulls the field name out of a serde message such as
/// "missing field `name`" or "unknown field `is_current`, expected ...".
fn quoted_field<'a>(message: &'a str, marker: &str) -> Option<&'a str> {
    message
        .split(marker)
        .nth(1)
        .and_then(|s| s.split('`').next())
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let message = rejection.body_text();

    if let Some(field) = quoted_field(&message, "missing field `") {
        return AppError::bad_request(anyhow!("{} is required", field));
    }
    if let Some(field) = quoted_field(&message, "unknown field `") {
        return AppError::bad_request(anyhow!("Unknown field '{}'", field));
    }
    if message.contains("invalid type") || message.contains("invalid value") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

/// JSON body extractor that also runs `validator` rules.
///
/// Unparseable bodies are rejected with 400, rule violations with 422
/// naming the offending field.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;

        value.validate().map_err(AppError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_field() {
        assert_eq!(
            quoted_field("missing field `name` at line 1", "missing field `"),
            Some("name")
        );
        assert_eq!(
            quoted_field(
                "unknown field `is_current`, expected one of `name`",
                "unknown field `"
            ),
            Some("is_current")
        );
        assert_eq!(quoted_field("expected value", "missing field `"), None);
    }
}
