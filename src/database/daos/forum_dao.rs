use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::database::manager::DatabaseError;
use crate::database::models::Forum;

/// Listing filters for the public forum index.
#[derive(Debug, Default)]
pub struct ForumFilter<'a> {
    pub category: Option<&'a str>,
    pub university: Option<&'a str>,
    pub search: Option<&'a str>,
}

pub struct ForumDao {
    pool: PgPool,
}

impl ForumDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, forum: &Forum) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO forums
                (id, author_id, title, description, photo_urls, like_count, dislike_count,
                 comment_count, university, category, created_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(forum.id)
        .bind(forum.author_id)
        .bind(&forum.title)
        .bind(&forum.description)
        .bind(&forum.photo_urls)
        .bind(forum.like_count)
        .bind(forum.dislike_count)
        .bind(forum.comment_count)
        .bind(&forum.university)
        .bind(&forum.category)
        .bind(forum.created_at)
        .bind(forum.updated_at)
        .bind(forum.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::for_entity("Forum", e))?;

        Ok(())
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<Forum>, DatabaseError> {
        let forum = sqlx::query_as::<_, Forum>("SELECT * FROM forums WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(forum)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Forum, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Forum"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        photo_urls: Option<&[String]>,
        category: Option<&str>,
    ) -> Result<Forum, DatabaseError> {
        let forum = sqlx::query_as::<_, Forum>(
            r#"
            UPDATE forums
            SET title       = COALESCE($2, title),
                description = COALESCE($3, description),
                photo_urls  = COALESCE($4, photo_urls),
                category    = COALESCE($5, category),
                updated_at  = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(photo_urls)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Forum"))?;

        Ok(forum)
    }

    /// Soft-delete a forum together with its comments, in one transaction,
    /// so the comments listing never serves orphans of a deleted forum.
    pub async fn soft_delete_with_comments(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let result =
            sqlx::query("UPDATE forums SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Forum"));
        }

        sqlx::query(
            "UPDATE comments SET is_active = FALSE, updated_at = now() WHERE forum_id = $1 AND is_active",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn list(
        &self,
        filter: &ForumFilter<'_>,
        page: Page,
    ) -> Result<(Vec<Forum>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Forum>(
            r#"
            SELECT * FROM forums
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR university = $2)
              AND ($3::text IS NULL
                   OR title ILIKE '%' || $3 || '%'
                   OR description ILIKE '%' || $3 || '%')
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filter.category)
        .bind(filter.university)
        .bind(filter.search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM forums
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR university = $2)
              AND ($3::text IS NULL
                   OR title ILIKE '%' || $3 || '%'
                   OR description ILIKE '%' || $3 || '%')
            "#,
        )
        .bind(filter.category)
        .bind(filter.university)
        .bind(filter.search)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn list_by_author(
        &self,
        author_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Forum>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Forum>(
            r#"
            SELECT * FROM forums
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
            sqlx::query_as("SELECT COUNT(*) FROM forums WHERE author_id = $1 AND is_active")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((items, total))
    }
}
