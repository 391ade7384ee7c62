//! Contact message

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn receive(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), email: email.into(), message: message.into(), is_read: false, created_at: Utc::now() }
    }
}
