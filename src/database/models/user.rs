use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_USER: &str = "user";
pub const ROLE_MODERATOR: &str = "moderator";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    /// Argon2 PHC string; never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub gender: Option<String>,
    pub university: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub registered_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_moderator(&self) -> bool {
        self.role == ROLE_MODERATOR || self.role == ROLE_ADMIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@example.com".to_string(),
            username: "a".to_string(),
            password_hash: "$argon2id$...".to_string(),
            gender: None,
            university: None,
            avatar_url: None,
            role: role.to_string(),
            registered_at: Utc::now(),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let value = serde_json::to_value(user(ROLE_USER)).unwrap();
        assert!(value.get("password_hash").is_none());
        assert!(value.get("email").is_some());
    }

    #[test]
    fn admin_implies_moderator() {
        assert!(user(ROLE_ADMIN).is_moderator());
        assert!(user(ROLE_MODERATOR).is_moderator());
        assert!(!user(ROLE_USER).is_moderator());
    }
}
