//! User account

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Name and email of a user as embedded in admin order views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn register(name: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        Self { id: Uuid::now_v7(), name: name.into(), email: email.into(), password_hash, is_admin: false, created_at: Utc::now() }
    }

    pub fn admin(name: impl Into<String>, email: impl Into<String>, password_hash: String) -> Self {
        Self { is_admin: true, ..Self::register(name, email, password_hash) }
    }

    pub fn to_ref(&self) -> UserRef { UserRef { id: self.id, name: self.name.clone(), email: self.email.clone() } }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_password_hash_not_serialized() {
        let u = User::register("Asha", "asha@example.com", "$argon2id$secret".into());
        let json = serde_json::to_value(&u).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["isAdmin"], false);
        assert_eq!(json["email"], "asha@example.com");
    }
}
