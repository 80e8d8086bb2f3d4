use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::database::manager::DatabaseError;
use crate::database::models::Media;

pub struct MediaDao {
    pool: PgPool,
}

impl MediaDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, media: &Media) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO media
                (id, uploader_id, file_name, original_file_name, mime_type, size_bytes,
                 url, storage_key, backend, owner_type, owner_id, description,
                 created_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(media.id)
        .bind(media.uploader_id)
        .bind(&media.file_name)
        .bind(&media.original_file_name)
        .bind(&media.mime_type)
        .bind(media.size_bytes)
        .bind(&media.url)
        .bind(&media.storage_key)
        .bind(&media.backend)
        .bind(&media.owner_type)
        .bind(media.owner_id)
        .bind(&media.description)
        .bind(media.created_at)
        .bind(media.updated_at)
        .bind(media.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::for_entity("Media", e))?;

        Ok(())
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<Media>, DatabaseError> {
        let media = sqlx::query_as::<_, Media>("SELECT * FROM media WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(media)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Media, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Media"))
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE media SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Media"));
        }
        Ok(())
    }

    pub async fn list_by_owner(
        &self,
        owner_type: &str,
        owner_id: Uuid,
    ) -> Result<Vec<Media>, DatabaseError> {
        let items = sqlx::query_as::<_, Media>(
            r#"
            SELECT * FROM media
            WHERE owner_type = $1 AND owner_id = $2 AND is_active
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_type)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn list_by_uploader(
        &self,
        uploader_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Media>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Media>(
            r#"
            SELECT * FROM media
            WHERE uploader_id = $1 AND is_active
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(uploader_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM media WHERE uploader_id = $1 AND is_active")
                .bind(uploader_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((items, total))
    }
}
