use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub closes_at: Option<DateTime<Utc>>,
    pub university: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Poll {
    /// A poll without an expiry stays open indefinitely.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        match self.closes_at {
            Some(closes_at) => now < closes_at,
            None => true,
        }
    }
}

/// One selectable choice. `vote_count` is a cache of the poll_votes table,
/// incremented atomically in the same transaction as the vote row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub label: String,
    pub position: i32,
    pub vote_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn poll(closes_at: Option<DateTime<Utc>>) -> Poll {
        let now = Utc::now();
        Poll {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            title: "favorite color".to_string(),
            description: None,
            closes_at,
            university: None,
            category: None,
            created_at: now,
            updated_at: now,
            is_active: true,
        }
    }

    #[test]
    fn poll_without_expiry_is_open() {
        assert!(poll(None).is_open(Utc::now()));
    }

    #[test]
    fn poll_closes_at_expiry() {
        let now = Utc::now();
        assert!(poll(Some(now + Duration::hours(1))).is_open(now));
        assert!(!poll(Some(now - Duration::hours(1))).is_open(now));
    }
}
