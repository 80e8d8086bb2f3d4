use sqlx::PgPool;
use uuid::Uuid;

use crate::api::Page;
use crate::database::manager::DatabaseError;
use crate::database::models::User;

/// Data access for user accounts. Uniqueness of email/username among active
/// accounts is enforced by partial unique indexes; inserts translate those
/// violations into conflicts.
pub struct UserDao {
    pool: PgPool,
}

impl UserDao {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, user: &User) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO users
                (id, email, username, password_hash, gender, university, avatar_url,
                 role, registered_at, last_login_at, created_at, updated_at, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.gender)
        .bind(&user.university)
        .bind(&user.avatar_url)
        .bind(&user.role)
        .bind(user.registered_at)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::for_entity("Account", e))?;

        Ok(())
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_active(&self, id: Uuid) -> Result<User, DatabaseError> {
        self.find_active(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("User"))
    }

    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(email) = lower($1) AND is_active",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE lower(username) = lower($1) AND is_active",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Update the mutable profile fields; absent fields keep their value.
    pub async fn update_profile(
        &self,
        id: Uuid,
        gender: Option<&str>,
        university: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET gender     = COALESCE($2, gender),
                university = COALESCE($3, university),
                avatar_url = COALESCE($4, avatar_url),
                updated_at = now()
            WHERE id = $1 AND is_active
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(gender)
        .bind(university)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User"))?;

        Ok(user)
    }

    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DatabaseError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1 AND is_active")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User"));
        }
        Ok(())
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE users SET last_login_at = now(), updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1 AND is_active")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("User"));
        }
        Ok(())
    }

    /// Groups the user is an active member of, newest group first.
    pub async fn groups_for_member(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<(Vec<crate::database::models::Group>, i64), DatabaseError> {
        let items = sqlx::query_as::<_, crate::database::models::Group>(
            r#"
            SELECT g.*
            FROM groups g
            JOIN group_members m ON m.group_id = g.id
            WHERE m.user_id = $1 AND m.status = 'active' AND g.is_active
            ORDER BY g.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM groups g
            JOIN group_members m ON m.group_id = g.id
            WHERE m.user_id = $1 AND m.status = 'active' AND g.is_active
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((items, total))
    }
}
