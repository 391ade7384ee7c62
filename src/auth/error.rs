//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer token on a protected route.
    #[error("Authentication required")]
    MissingToken,

    /// Token is malformed, tampered with or expired.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Wrong email or password. The two are deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authenticated, but not an administrator.
    #[error("Admin access required")]
    Forbidden,

    #[error("password hashing failed")]
    PasswordHash,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingToken | Self::InvalidToken | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
