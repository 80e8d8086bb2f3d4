use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PRIVACY_OPEN: &str = "open";
pub const PRIVACY_CLOSED: &str = "closed";
pub const PRIVACY_SECRET: &str = "secret";

pub const MEMBER_ROLE_MEMBER: &str = "member";
pub const MEMBER_ROLE_MODERATOR: &str = "moderator";
pub const MEMBER_ROLE_OWNER: &str = "owner";

pub const MEMBER_STATUS_ACTIVE: &str = "active";
pub const MEMBER_STATUS_PENDING: &str = "pending";
pub const MEMBER_STATUS_BANNED: &str = "banned";

/// A user-owned group. `member_count` caches the number of active members.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub privacy: String,
    pub categories: Vec<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Group {
    pub fn is_secret(&self) -> bool {
        self.privacy == PRIVACY_SECRET
    }
}

/// Membership row. The (group_id, user_id) primary key keeps membership a
/// set; joining twice updates the row instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn is_active(&self) -> bool {
        self.status == MEMBER_STATUS_ACTIVE
    }

    pub fn can_manage(&self) -> bool {
        self.is_active()
            && (self.role == MEMBER_ROLE_OWNER || self.role == MEMBER_ROLE_MODERATOR)
    }
}
