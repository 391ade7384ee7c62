//! Runtime configuration from environment variables.
//!
//! `.env` is loaded by `main` before this runs. Every setting except the
//! secrets has a default; unset optional values are logged so a misconfigured
//! deployment is visible at startup.

use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Credentials of the administrator created at startup.
#[derive(Clone, Debug)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// `None` means a random key per process; tokens then die with the process.
    pub token_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub nats_url: Option<String>,
    pub admin: Option<AdminBootstrap>,
    pub seed_catalog: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let admin = match (optional("ADMIN_EMAIL"), optional("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminBootstrap { email, password }),
            (None, None) => None,
            _ => {
                warn!("ADMIN_EMAIL and ADMIN_PASSWORD must be set together, skipping admin bootstrap");
                None
            }
        };

        Ok(Self {
            port: parse_or(&lookup, "PORT", 3000)?,
            database_url: optional("DATABASE_URL"),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            token_secret: optional("TOKEN_SECRET"),
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", 24)?,
            nats_url: optional("NATS_URL"),
            admin,
            seed_catalog: parse_or(&lookup, "SEED_CATALOG", false)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid { key, message: e.to_string() }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
