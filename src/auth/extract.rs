//! Extractors that authenticate a request from its bearer token.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, Claims};
use crate::state::AppState;

/// Any signed-in user.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Claims);

/// A signed-in administrator; other users are rejected with 403.
#[derive(Clone, Debug)]
pub struct AdminUser(pub Claims);

fn bearer(parts: &Parts) -> Result<&str, AuthError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = crate::error::AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = state.auth.verify(bearer(parts)?)?;
        Ok(Self(claims))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = crate::error::AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        if !claims.admin {
            tracing::warn!(user_id = %claims.sub, path = %parts.uri.path(), "Non-admin on admin route");
            return Err(AuthError::Forbidden.into());
        }
        Ok(Self(claims))
    }
}
