use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// What a reaction is attached to. The variants pin the counter table name,
/// so no identifier ever reaches SQL from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionSubject {
    Forum,
    Comment,
}

impl ReactionSubject {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionSubject::Forum => "forum",
            ReactionSubject::Comment => "comment",
        }
    }

    fn counter_table(&self) -> &'static str {
        match self {
            ReactionSubject::Forum => "forums",
            ReactionSubject::Comment => "comments",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Dislike => "dislike",
        }
    }

    fn counter_column(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like_count",
            ReactionKind::Dislike => "dislike_count",
        }
    }
}

/// Updated (like_count, dislike_count) after a reaction is applied.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ReactionCounts {
    pub like_count: i64,
    pub dislike_count: i64,
}

/// Data access for reactions. The reactions table is the authoritative
/// record; the like/dislike counters on forums and comments are caches
/// updated in the same transaction, so reads never observe a drifted count.
pub struct ReactionDao {
    pool: PgPool,
}

impl ReactionDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply one user's reaction to a subject. At most one reaction per
    /// (subject, user): repeating the same kind is a conflict; switching
    /// kind moves the counters atomically.
    pub async fn apply(
        &self,
        subject: ReactionSubject,
        subject_id: Uuid,
        user_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionCounts, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT kind FROM reactions
            WHERE subject_type = $1 AND subject_id = $2 AND user_id = $3
            FOR UPDATE
            "#,
        )
        .bind(subject.as_str())
        .bind(subject_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let table = subject.counter_table();

        match existing {
            Some((previous,)) if previous == kind.as_str() => {
                return Err(DatabaseError::Conflict(format!(
                    "Already reacted with {}",
                    kind.as_str()
                )));
            }
            Some(_) => {
                sqlx::query(
                    r#"
                    UPDATE reactions SET kind = $4, created_at = now()
                    WHERE subject_type = $1 AND subject_id = $2 AND user_id = $3
                    "#,
                )
                .bind(subject.as_str())
                .bind(subject_id)
                .bind(user_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await?;

                let old_column = match kind {
                    ReactionKind::Like => ReactionKind::Dislike.counter_column(),
                    ReactionKind::Dislike => ReactionKind::Like.counter_column(),
                };
                let sql = format!(
                    "UPDATE {table} SET {old} = {old} - 1, {new} = {new} + 1, updated_at = now() WHERE id = $1",
                    table = table,
                    old = old_column,
                    new = kind.counter_column(),
                );
                sqlx::query(&sql).bind(subject_id).execute(&mut *tx).await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO reactions (subject_type, subject_id, user_id, kind, created_at)
                    VALUES ($1, $2, $3, $4, now())
                    "#,
                )
                .bind(subject.as_str())
                .bind(subject_id)
                .bind(user_id)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await?;

                let sql = format!(
                    "UPDATE {table} SET {new} = {new} + 1, updated_at = now() WHERE id = $1",
                    table = table,
                    new = kind.counter_column(),
                );
                sqlx::query(&sql).bind(subject_id).execute(&mut *tx).await?;
            }
        }

        let sql = format!(
            "SELECT like_count, dislike_count FROM {} WHERE id = $1",
            table
        );
        let (like_count, dislike_count): (i64, i64) = sqlx::query_as(&sql)
            .bind(subject_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ReactionCounts {
            like_count,
            dislike_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_pins_counter_table() {
        assert_eq!(ReactionSubject::Forum.counter_table(), "forums");
        assert_eq!(ReactionSubject::Comment.counter_table(), "comments");
    }

    #[test]
    fn kind_pins_counter_column() {
        assert_eq!(ReactionKind::Like.counter_column(), "like_count");
        assert_eq!(ReactionKind::Dislike.counter_column(), "dislike_count");
    }
}
