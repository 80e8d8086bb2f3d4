use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::database::manager::DatabaseError;
use crate::database::models::group::{Group, GroupMember, MEMBER_ROLE_OWNER, MEMBER_STATUS_ACTIVE};

pub struct GroupDao {
    pool: PgPool,
}

impl GroupDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a group and enroll the creator as its owner member in one
    /// transaction; member_count starts at 1 for exactly that reason.
    pub async fn insert_with_owner(&self, group: &Group) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO groups
                (id, owner_id, name, description, logo_url, cover_url, privacy,
                 categories, member_count, created_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(group.id)
        .bind(group.owner_id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.logo_url)
        .bind(&group.cover_url)
        .bind(&group.privacy)
        .bind(&group.categories)
        .bind(group.member_count)
        .bind(group.created_at)
        .bind(group.updated_at)
        .bind(group.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::for_entity("Group", e))?;

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, now())
            "#,
        )
        .bind(group.id)
        .bind(group.owner_id)
        .bind(MEMBER_ROLE_OWNER)
        .bind(MEMBER_STATUS_ACTIVE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<Group>, DatabaseError> {
        let group = sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<Group, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Group"))
    }

    pub async fn find_active_by_name(&self, name: &str) -> Result<Option<Group>, DatabaseError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT * FROM groups WHERE lower(name) = lower($1) AND is_active",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(group)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
        logo_url: Option<&str>,
        cover_url: Option<&str>,
        privacy: Option<&str>,
        categories: Option<&[String]>,
    ) -> Result<Group, DatabaseError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET name        = COALESCE($2, name),
                description = COALESCE($3, description),
                logo_url    = COALESCE($4, logo_url),
                cover_url   = COALESCE($5, cover_url),
                privacy     = COALESCE($6, privacy),
                categories  = COALESCE($7, categories),
                updated_at  = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(logo_url)
        .bind(cover_url)
        .bind(privacy)
        .bind(categories)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::for_entity("Group", e))?
        .ok_or_else(|| DatabaseError::not_found("Group"))?;

        Ok(group)
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            "UPDATE groups SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Group"));
        }
        Ok(())
    }

    /// Public group index; secret groups are excluded unless requested by an
    /// admin view.
    pub async fn list(
        &self,
        search: Option<&str>,
        include_secret: bool,
        page: Page,
    ) -> Result<(Vec<Group>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, Group>(
            r#"
            SELECT * FROM groups
            WHERE is_active
              AND ($1::bool OR privacy <> 'secret')
              AND ($2::text IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR description ILIKE '%' || $2 || '%')
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(include_secret)
        .bind(search)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM groups
            WHERE is_active
              AND ($1::bool OR privacy <> 'secret')
              AND ($2::text IS NULL
                   OR name ILIKE '%' || $2 || '%'
                   OR description ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(include_secret)
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    pub async fn member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, DatabaseError> {
        let member = sqlx::query_as::<_, GroupMember>(
            "SELECT * FROM group_members WHERE group_id = $1 AND user_id = $2",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    pub async fn members_by_status(
        &self,
        group_id: Uuid,
        status: &str,
        page: Page,
    ) -> Result<(Vec<GroupMember>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT * FROM group_members
            WHERE group_id = $1 AND status = $2
            ORDER BY joined_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(group_id)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM group_members WHERE group_id = $1 AND status = $2",
        )
        .bind(group_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }

    /// Enroll a user. Only an active enrollment counts toward member_count.
    pub async fn add_member(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: &str,
        status: &str,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id, role, status, joined_at)
            VALUES ($1, $2, $3, $4, now())
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .bind(status)
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::for_entity("Membership", e))?;

        if status == MEMBER_STATUS_ACTIVE {
            sqlx::query(
                "UPDATE groups SET member_count = member_count + 1, updated_at = now() WHERE id = $1",
            )
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Remove an enrollment, decrementing the counter when it was active.
    pub async fn remove_member(&self, group_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let removed: Option<(String,)> = sqlx::query_as(
            "DELETE FROM group_members WHERE group_id = $1 AND user_id = $2 RETURNING status",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((status,)) = removed else {
            return Err(DatabaseError::not_found("Membership"));
        };

        if status == MEMBER_STATUS_ACTIVE {
            sqlx::query(
                "UPDATE groups SET member_count = member_count - 1, updated_at = now() WHERE id = $1",
            )
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn update_member_role(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> Result<GroupMember, DatabaseError> {
        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            UPDATE group_members SET role = $3
            WHERE group_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Membership"))?;

        Ok(member)
    }

    /// Move an enrollment between statuses, keeping member_count in step
    /// with transitions into and out of `active`.
    pub async fn set_member_status(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        status: &str,
    ) -> Result<GroupMember, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let previous: Option<(String,)> = sqlx::query_as(
            "SELECT status FROM group_members WHERE group_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((previous,)) = previous else {
            return Err(DatabaseError::not_found("Membership"));
        };

        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            UPDATE group_members SET status = $3
            WHERE group_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        let was_active = previous == MEMBER_STATUS_ACTIVE;
        let now_active = status == MEMBER_STATUS_ACTIVE;
        if !was_active && now_active {
            sqlx::query(
                "UPDATE groups SET member_count = member_count + 1, updated_at = now() WHERE id = $1",
            )
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        } else if was_active && !now_active {
            sqlx::query(
                "UPDATE groups SET member_count = member_count - 1, updated_at = now() WHERE id = $1",
            )
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(member)
    }
}
