use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{
    decode_token, generate_access_token, generate_reset_token, hash_password, verify_password,
    TokenScope,
};
use crate::context::SharedContext;
use crate::database::daos::UserDao;
use crate::database::models::{user::ROLE_USER, User};
use crate::error::ApiError;

/// Registration, login and password lifecycle.
pub struct AuthService {
    users: UserDao,
    ctx: SharedContext,
}

/// Registration payload after boundary validation.
pub struct Registration {
    pub email: String,
    pub username: String,
    pub password: String,
    pub gender: Option<String>,
    pub university: Option<String>,
}

pub struct AuthenticatedUser {
    pub user: User,
    pub token: String,
}

impl AuthService {
    pub fn new(ctx: SharedContext) -> Self {
        Self {
            users: UserDao::new(ctx.db.clone()),
            ctx,
        }
    }

    /// Create an account and hand back a usable token, so a register/login
    /// round trip is never required.
    pub async fn register(&self, reg: Registration) -> Result<AuthenticatedUser, ApiError> {
        if self.users.find_active_by_email(&reg.email).await?.is_some() {
            return Err(ApiError::conflict("Email address already in use"));
        }
        if self
            .users
            .find_active_by_username(&reg.username)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict("Username already in use"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: reg.email,
            username: reg.username,
            password_hash: hash_password(&reg.password)?,
            gender: reg.gender,
            university: reg.university,
            avatar_url: None,
            role: ROLE_USER.to_string(),
            registered_at: now,
            last_login_at: Some(now),
            created_at: now,
            updated_at: now,
            is_active: true,
        };

        self.users.insert(&user).await?;
        info!(user_id = %user.id, "New account registered");

        let token = generate_access_token(&self.ctx.config.security, user.id)?;
        Ok(AuthenticatedUser { user, token })
    }

    /// Authenticate by email and password. Unknown account, wrong password
    /// and disabled account are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, ApiError> {
        let invalid = || ApiError::unauthorized("Invalid email or password");

        let mut user = self
            .users
            .find_active_by_email(email)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash) {
            return Err(invalid());
        }

        self.users.touch_last_login(user.id).await?;
        user.last_login_at = Some(Utc::now());

        let token = generate_access_token(&self.ctx.config.security, user.id)?;
        Ok(AuthenticatedUser { user, token })
    }

    pub async fn current_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        Ok(self.users.get_active(user_id).await?)
    }

    /// Fresh access token for an account that is still active.
    pub async fn refresh_token(&self, user_id: Uuid) -> Result<String, ApiError> {
        let user = self
            .users
            .find_active(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Account disabled"))?;

        Ok(generate_access_token(&self.ctx.config.security, user.id)?)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let user = self.users.get_active(user_id).await?;

        if !verify_password(current_password, &user.password_hash) {
            return Err(ApiError::unauthorized("Current password is incorrect"));
        }

        let hash = hash_password(new_password)?;
        self.users.update_password(user.id, &hash).await?;
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Start a password reset. Succeeds whether or not the address exists so
    /// the endpoint cannot be used to enumerate accounts; the reset token is
    /// only returned in the response body in development, where there is no
    /// mail pipeline to deliver it.
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
        let Some(user) = self.users.find_active_by_email(email).await? else {
            return Ok(None);
        };

        let token = generate_reset_token(&self.ctx.config.security, user.id)?;
        info!(user_id = %user.id, "Password reset token issued");

        if self.ctx.config.is_development() {
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    /// Consume a reset-scoped token and set a new password. Access tokens
    /// are rejected here; a stolen API token must not reset credentials.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let claims = decode_token(&self.ctx.config.security, token)
            .map_err(|_| ApiError::unauthorized("Invalid or expired password reset token"))?;

        if claims.scope != TokenScope::PasswordReset {
            return Err(ApiError::unauthorized(
                "Invalid or expired password reset token",
            ));
        }

        let user = self
            .users
            .find_active(claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired password reset token"))?;

        let hash = hash_password(new_password)?;
        self.users.update_password(user.id, &hash).await?;
        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}
