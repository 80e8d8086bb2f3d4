use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::database::manager::DatabaseError;
use crate::database::models::Comment;

pub struct CommentDao {
    pool: PgPool,
}

impl CommentDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a comment and bump the parent forum's comment counter in the
    /// same transaction. The counter uses an atomic increment, never
    /// read-modify-write.
    pub async fn insert_with_counter(&self, comment: &Comment) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO comments
                (id, forum_id, author_id, parent_id, body, photo_urls,
                 like_count, dislike_count, created_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(comment.id)
        .bind(comment.forum_id)
        .bind(comment.author_id)
        .bind(comment.parent_id)
        .bind(&comment.body)
        .bind(&comment.photo_urls)
        .bind(comment.like_count)
        .bind(comment.dislike_count)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .bind(comment.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::for_entity("Comment", e))?;

        sqlx::query(
            "UPDATE forums SET comment_count = comment_count + 1, updated_at = now() WHERE id = $1",
        )
        .bind(comment.forum_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<Comment>, DatabaseError> {
        let comment =
            sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1 AND is_active")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(comment)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Comment, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Comment"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        body: Option<&str>,
        photo_urls: Option<&[String]>,
    ) -> Result<Comment, DatabaseError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET body       = COALESCE($2, body),
                photo_urls = COALESCE($3, photo_urls),
                updated_at = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(body)
        .bind(photo_urls)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Comment"))?;

        Ok(comment)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE comments SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Comment"));
        }
        Ok(())
    }

    /// Top-level comments of a forum, newest first.
    pub async fn list_top_level(
        &self,
        forum_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Comment>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE forum_id = $1 AND parent_id IS NULL AND is_active
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(forum_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM comments WHERE forum_id = $1 AND parent_id IS NULL AND is_active",
        )
        .bind(forum_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    /// Replies for a batch of parent comments, oldest first, for assembling
    /// threads without a query per comment.
    pub async fn replies_for_parents(
        &self,
        parent_ids: &[Uuid],
    ) -> Result<Vec<Comment>, DatabaseError> {
        if parent_ids.is_empty() {
            return Ok(vec![]);
        }

        let replies = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE parent_id = ANY($1) AND is_active
            ORDER BY created_at ASC
            "#,
        )
        .bind(parent_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(replies)
    }

    pub async fn list_replies(
        &self,
        parent_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Comment>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
            WHERE parent_id = $1 AND is_active
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(parent_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE parent_id = $1 AND is_active")
                .bind(parent_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((items, total))
    }

    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Comment>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM comments
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
            sqlx::query_as("SELECT COUNT(*) FROM comments WHERE author_id = $1 AND is_active")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((items, total))
    }
}
