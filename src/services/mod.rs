//! Business operations, one service per component.
//!
//! Services borrow the store (and whatever else they need) from
//! [`AppState`](crate::state::AppState) for the duration of a request. They
//! own validation, foreign-reference resolution and error classification;
//! handlers only translate HTTP.

pub mod accounts;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod inbox;
pub mod orders;

use validator::ValidationError;

/// Rejects empty or whitespace-only strings.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::Duration;

    use crate::auth::Authenticator;
    use crate::events::EventPublisher;
    use crate::state::AppState;
    use crate::store::MemoryStore;

    pub fn state() -> AppState { state_with(Arc::new(MemoryStore::new())) }

    pub fn state_with(store: Arc<MemoryStore>) -> AppState {
        AppState::new(store, Authenticator::new(b"test-secret".to_vec(), Duration::hours(1)), EventPublisher::disabled())
    }
}
