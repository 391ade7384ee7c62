//! Shared handler state.

use std::sync::Arc;

use crate::auth::Authenticator;
use crate::events::EventPublisher;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<Authenticator>,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, auth: Authenticator, events: EventPublisher) -> Self {
        Self { store, auth: Arc::new(auth), events }
    }
}
