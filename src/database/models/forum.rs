use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user-authored post. Reaction and comment counters are denormalized
/// caches of the reactions/comments tables, maintained transactionally.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Forum {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub photo_urls: Vec<String>,
    pub like_count: i64,
    pub dislike_count: i64,
    pub comment_count: i64,
    pub university: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}
