//! Registration, login and admin bootstrap.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::not_blank;
use crate::auth::{AuthError, Authenticator};
use crate::domain::aggregates::User;
use crate::error::{AppError, Result};
use crate::store::{Store, StoreError};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Registration {
    #[validate(custom(function = "not_blank", message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login body. The email is not format-checked so operator accounts with
/// plain usernames can sign in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

pub struct AccountService<'a> {
    store: &'a dyn Store,
    auth: &'a Authenticator,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a dyn Store, auth: &'a Authenticator) -> Self { Self { store, auth } }

    #[instrument(skip_all)]
    pub async fn register(&self, input: Registration) -> Result<AuthSession> {
        input.validate()?;
        let email = normalize_email(&input.email);
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(user_exists());
        }
        let hash = self.auth.hash_password(&input.password)?;
        let user = User::register(input.name.trim(), email, hash);
        self.store.insert_user(&user).await.map_err(|e| match e {
            StoreError::Duplicate(_) => user_exists(),
            other => other.into(),
        })?;
        info!(user_id = %user.id, "User registered");
        self.session(user)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip_all)]
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession> {
        let email = normalize_email(&credentials.email);
        let Some(user) = self.store.user_by_email(&email).await? else {
            warn!("Login for unknown account");
            return Err(AuthError::InvalidCredentials.into());
        };
        if let Err(e) = self.auth.verify_password(&credentials.password, &user.password_hash) {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(e.into());
        }
        self.session(user)
    }

    #[instrument(skip(self))]
    pub async fn me(&self, user_id: Uuid) -> Result<User> {
        self.store
            .user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Creates the configured administrator unless the email is taken.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool> {
        let email = normalize_email(email);
        if self.store.user_by_email(&email).await?.is_some() {
            return Ok(false);
        }
        let admin = User::admin("Administrator", email, self.auth.hash_password(password)?);
        self.store.insert_user(&admin).await?;
        info!(user_id = %admin.id, email = %admin.email, "Admin account created");
        Ok(true)
    }

    fn session(&self, user: User) -> Result<AuthSession> {
        Ok(AuthSession { token: self.auth.issue(&user)?, user })
    }
}

fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

fn user_exists() -> AppError { AppError::Conflict("User already exists".into()) }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    fn registration(email: &str, password: &str) -> Registration {
        Registration { name: "Asha".into(), email: email.into(), password: password.into() }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials { email: email.into(), password: password.into() }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let state = testing::state();
        let accounts = AccountService::new(state.store.as_ref(), &state.auth);
        let session = accounts.register(registration("Asha@Example.com", "secret1")).await.unwrap();
        assert_eq!(session.user.email, "asha@example.com");
        assert!(!session.user.is_admin);
        let claims = state.auth.verify(&session.token).unwrap();
        assert_eq!(claims.sub, session.user.id);

        let login = accounts.login(credentials("asha@example.com", "secret1")).await.unwrap();
        assert_eq!(login.user.id, session.user.id);
        assert_eq!(accounts.me(session.user.id).await.unwrap().name, "Asha");
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input_and_duplicates() {
        let state = testing::state();
        let accounts = AccountService::new(state.store.as_ref(), &state.auth);
        let err = accounts.register(registration("not-an-email", "secret1")).await.unwrap_err();
        assert_eq!(err.to_string(), "A valid email is required");
        let err = accounts.register(registration("asha@example.com", "123")).await.unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");

        accounts.register(registration("asha@example.com", "secret1")).await.unwrap();
        let err = accounts.register(registration("ASHA@example.com", "secret2")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_failures_look_alike() {
        let state = testing::state();
        let accounts = AccountService::new(state.store.as_ref(), &state.auth);
        accounts.register(registration("asha@example.com", "secret1")).await.unwrap();

        let unknown = accounts.login(credentials("nobody@example.com", "secret1")).await.unwrap_err();
        let wrong = accounts.login(credentials("asha@example.com", "wrong-pass")).await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let state = testing::state();
        let accounts = AccountService::new(state.store.as_ref(), &state.auth);
        assert!(accounts.ensure_admin("admin", "admin").await.unwrap());
        assert!(!accounts.ensure_admin("admin", "other").await.unwrap());

        let session = accounts.login(credentials("admin", "admin")).await.unwrap();
        assert!(session.user.is_admin);
        assert!(state.auth.verify(&session.token).unwrap().admin);
    }
}
