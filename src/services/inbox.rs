//! Contact messages: anonymous submission, admin triage.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::not_blank;
use crate::domain::aggregates::Message;
use crate::domain::events::DomainEvent;
use crate::error::{AppError, Result};
use crate::events::EventPublisher;
use crate::store::Store;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct NewMessage {
    #[validate(custom = "not_blank")]
    pub name: String,
    #[validate(custom = "not_blank")]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

pub struct InboxService<'a> {
    store: &'a dyn Store,
    events: &'a EventPublisher,
}

impl<'a> InboxService<'a> {
    pub fn new(store: &'a dyn Store, events: &'a EventPublisher) -> Self { Self { store, events } }

    #[instrument(skip_all)]
    pub async fn submit(&self, input: NewMessage) -> Result<Message> {
        input
            .validate()
            .map_err(|_| AppError::Validation("All fields are required".into()))?;
        let message = Message::receive(input.name.trim(), input.email.trim(), input.message.trim());
        self.store.insert_message(&message).await?;
        info!(message_id = %message.id, "Message received");
        self.events.publish(DomainEvent::MessageReceived { message_id: message.id }).await;
        Ok(message)
    }

    /// Newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Message>> { Ok(self.store.messages().await?) }

    #[instrument(skip(self))]
    pub async fn unread_count(&self) -> Result<UnreadCount> {
        Ok(UnreadCount { count: self.store.count_unread_messages().await? })
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, id: Uuid) -> Result<Message> {
        self.store.mark_message_read(id).await?.ok_or_else(message_not_found)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_message(id).await? {
            return Err(message_not_found());
        }
        Ok(())
    }
}

fn message_not_found() -> AppError { AppError::NotFound("Message not found".into()) }
