//! Application error type and its HTTP mapping.
//!
//! Every handler returns `Result<T, AppError>`. Client mistakes are reported
//! verbatim; store failures are logged in full and answered with a generic
//! message so storage internals never reach the client.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Checkout attempted with no cart or an empty one.
    #[error("Cart is empty")]
    EmptyCart,

    /// Referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Referential-integrity or uniqueness block.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::EmptyCart | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(err) => err.status(),
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self { Self::Validation(describe(&errors)) }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self { Self::Validation(rejection.body_text()) }
}

/// First failing field, in name order, as a readable sentence.
fn describe(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);
    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("Invalid {field}"),
            })
        })
        .unwrap_or_else(|| "Invalid request".to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(err) => {
                tracing::error!(error = %err, "Store failure");
                "Server error".to_string()
            }
            Self::Auth(err) if status.is_server_error() => {
                tracing::error!(error = %err, "Auth failure");
                "Server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_validation_message_prefers_custom_text() {
        let err: AppError = Probe { name: String::new(), email: "ok@example.com".into() }.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "Name is required");
        let err: AppError = Probe { name: "x".into(), email: "nope".into() }.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "Invalid email");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::EmptyCart.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Store(StoreError::Unavailable("down".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::Auth(AuthError::Forbidden).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Auth(AuthError::MissingToken).status(), StatusCode::UNAUTHORIZED);
    }
}
