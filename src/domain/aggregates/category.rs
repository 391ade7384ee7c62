//! Category Aggregate

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Reference to a category as embedded in product views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

impl Category {
    pub fn create(name: impl Into<String>, description: Option<String>, image: Option<String>) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), description, image, is_active: true, created_at: Utc::now() }
    }

    pub fn to_ref(&self) -> CategoryRef { CategoryRef { id: self.id, name: self.name.clone() } }
}
