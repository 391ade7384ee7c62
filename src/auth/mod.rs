//! Identity provider: password hashing and signed bearer tokens.
//!
//! Tokens are `base64url(claims JSON) . base64url(HMAC-SHA256(claims))`. The
//! claims carry the admin flag, so a single login response tells the client
//! its role and every request is authorized without a store round trip.

mod error;
mod extract;

pub use error::AuthError;
pub use extract::{AdminUser, CurrentUser};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::aggregates::User;

type HmacSha256 = Hmac<Sha256>;

/// Verified identity carried by a bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub admin: bool,
    /// Expiry as a unix timestamp in seconds.
    pub exp: i64,
}

pub struct Authenticator {
    key: Vec<u8>,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(key: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self { key: key.into(), ttl }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| AuthError::PasswordHash)
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let claims = Claims { sub: user.id, admin: user.is_admin, exp: (Utc::now() + self.ttl).timestamp() };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(claims).map_err(|_| AuthError::InvalidToken)?;
        let body = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(body.as_bytes())?.finalize().into_bytes());
        Ok(format!("{body}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let (body, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD.decode(signature).map_err(|_| AuthError::InvalidToken)?;
        self.mac(body.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD.decode(body).map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }

    fn mac(&self, message: &[u8]) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|_| AuthError::InvalidToken)?;
        mac.update(message);
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator { Authenticator::new(b"test-secret".to_vec(), Duration::hours(1)) }

    #[test]
    fn test_password_round_trip() {
        let auth = authenticator();
        let hash = auth.hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(auth.verify_password("hunter22", &hash).is_ok());
        assert!(matches!(auth.verify_password("hunter23", &hash), Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.verify_password("hunter22", "not-a-hash"), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_token_carries_admin_flag() {
        let auth = authenticator();
        let admin = User::admin("Admin", "admin", String::new());
        let claims = auth.verify(&auth.issue(&admin).unwrap()).unwrap();
        assert_eq!(claims.sub, admin.id);
        assert!(claims.admin);

        let shopper = User::register("Asha", "asha@example.com", String::new());
        assert!(!auth.verify(&auth.issue(&shopper).unwrap()).unwrap().admin);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = authenticator();
        let user = User::register("Asha", "asha@example.com", String::new());
        let token = auth.issue(&user).unwrap();
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = Claims { sub: user.id, admin: true, exp: Utc::now().timestamp() + 3600 };
        let forged_body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap());
        assert!(matches!(auth.verify(&format!("{forged_body}.{signature}")), Err(AuthError::InvalidToken)));
        assert!(matches!(auth.verify("garbage"), Err(AuthError::InvalidToken)));

        let other = Authenticator::new(b"other-secret".to_vec(), Duration::hours(1));
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = authenticator();
        let claims = Claims { sub: Uuid::now_v7(), admin: false, exp: Utc::now().timestamp() - 1 };
        let token = auth.sign(&claims).unwrap();
        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken)));
    }
}
