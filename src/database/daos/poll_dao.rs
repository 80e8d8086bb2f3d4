use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::database::manager::DatabaseError;
use crate::database::models::{Poll, PollOption};

#[derive(Debug, Default)]
pub struct PollFilter<'a> {
    pub category: Option<&'a str>,
    pub university: Option<&'a str>,
    /// Some(true) = only open polls, Some(false) = only closed ones.
    pub open: Option<bool>,
}

pub struct PollDao {
    pool: PgPool,
}

impl PollDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a poll and its options in one transaction.
    pub async fn insert_with_options(
        &self,
        poll: &Poll,
        labels: &[String],
    ) -> Result<Vec<PollOption>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO polls
                (id, author_id, title, description, closes_at, university, category,
                 created_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(poll.id)
        .bind(poll.author_id)
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(poll.closes_at)
        .bind(&poll.university)
        .bind(&poll.category)
        .bind(poll.created_at)
        .bind(poll.updated_at)
        .bind(poll.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::for_entity("Poll", e))?;

        let mut options = Vec::with_capacity(labels.len());
        for (position, label) in labels.iter().enumerate() {
            let option = PollOption {
                id: Uuid::new_v4(),
                poll_id: poll.id,
                label: label.clone(),
                position: position as i32,
                vote_count: 0,
            };
            sqlx::query(
                "INSERT INTO poll_options (id, poll_id, label, position, vote_count) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(option.id)
            .bind(option.poll_id)
            .bind(&option.label)
            .bind(option.position)
            .bind(option.vote_count)
            .execute(&mut *tx)
            .await?;
            options.push(option);
        }

        tx.commit().await?;
        Ok(options)
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<Poll>, DatabaseError> {
        let poll = sqlx::query_as::<_, Poll>("SELECT * FROM polls WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(poll)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Poll, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Poll"))
    }

    pub async fn options(&self, poll_id: Uuid) -> Result<Vec<PollOption>, DatabaseError> {
        let options = sqlx::query_as::<_, PollOption>(
            "SELECT * FROM poll_options WHERE poll_id = $1 ORDER BY position",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    /// Options for a batch of polls, for listings that return polls with
    /// their options without a query per poll.
    pub async fn options_for_polls(
        &self,
        poll_ids: &[Uuid],
    ) -> Result<Vec<PollOption>, DatabaseError> {
        if poll_ids.is_empty() {
            return Ok(vec![]);
        }

        let options = sqlx::query_as::<_, PollOption>(
            "SELECT * FROM poll_options WHERE poll_id = ANY($1) ORDER BY poll_id, position",
        )
        .bind(poll_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
        closes_at: Option<DateTime<Utc>>,
    ) -> Result<Poll, DatabaseError> {
        let poll = sqlx::query_as::<_, Poll>(
            r#"
            UPDATE polls
            SET title       = COALESCE($2, title),
                description = COALESCE($3, description),
                category    = COALESCE($4, category),
                closes_at   = COALESCE($5, closes_at),
                updated_at  = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category)
        .bind(closes_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Poll"))?;

        Ok(poll)
    }

    /// Replace a poll's options wholesale. Existing votes refer to the old
    /// options, so they are discarded and every counter restarts at zero.
    pub async fn replace_options(
        &self,
        poll_id: Uuid,
        labels: &[String],
    ) -> Result<Vec<PollOption>, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM poll_votes WHERE poll_id = $1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM poll_options WHERE poll_id = $1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await?;

        let mut options = Vec::with_capacity(labels.len());
        for (position, label) in labels.iter().enumerate() {
            let option = PollOption {
                id: Uuid::new_v4(),
                poll_id,
                label: label.clone(),
                position: position as i32,
                vote_count: 0,
            };
            sqlx::query(
                "INSERT INTO poll_options (id, poll_id, label, position, vote_count) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(option.id)
            .bind(option.poll_id)
            .bind(&option.label)
            .bind(option.position)
            .bind(option.vote_count)
            .execute(&mut *tx)
            .await?;
            options.push(option);
        }

        tx.commit().await?;
        Ok(options)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE polls SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Poll"));
        }
        Ok(())
    }

    /// Record one user's vote. The (poll_id, user_id) primary key is the
    /// uniqueness authority: a second vote inserts nothing, leaves every
    /// counter untouched and surfaces as a conflict. The option must belong
    /// to the poll; both checks run inside the transaction.
    pub async fn record_vote(
        &self,
        poll_id: Uuid,
        user_id: Uuid,
        option_id: Uuid,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT poll_id FROM poll_options WHERE id = $1")
                .bind(option_id)
                .fetch_optional(&mut *tx)
                .await?;

        match owner {
            Some((owner_poll,)) if owner_poll == poll_id => {}
            _ => return Err(DatabaseError::not_found("Poll option")),
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO poll_votes (poll_id, user_id, option_id, created_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (poll_id, user_id) DO NOTHING
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(option_id)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(DatabaseError::Conflict(
                "Vote already cast for this poll".to_string(),
            ));
        }

        sqlx::query("UPDATE poll_options SET vote_count = vote_count + 1 WHERE id = $1")
            .bind(option_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &PollFilter<'_>,
        page: Page,
    ) -> Result<(Vec<Poll>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Poll>(
            r#"
            SELECT * FROM polls
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR university = $2)
              AND ($3::bool IS NULL
                   OR (closes_at IS NULL OR closes_at > now()) = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.category)
        .bind(filter.university)
        .bind(filter.open)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM polls
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR university = $2)
              AND ($3::bool IS NULL
                   OR (closes_at IS NULL OR closes_at > now()) = $3)
            "#,
        )
        .bind(filter.category)
        .bind(filter.university)
        .bind(filter.open)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Poll>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Poll>(
            r#"
            SELECT * FROM polls
            WHERE author_id = $1 AND is_active
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(author_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM polls WHERE author_id = $1 AND is_active")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((items, total))
    }
}
