//! Artisan Storefront
//!
//! Storefront and back office API for a shop selling handcrafted goods.
//!
//! ## Features
//! - Product catalog with categories and search
//! - Per-user carts and checkout with price snapshots
//! - Order history and admin status management
//! - Contact messages with an admin inbox
//! - Token authentication with an admin role

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;

pub use error::{AppError, Result};
pub use routes::router;
pub use state::AppState;
