use tracing::info;
use uuid::Uuid;

use crate::api::{Page, Paginated};
use crate::context::SharedContext;
use crate::database::daos::{CommentDao, ForumDao, PollDao, UserDao};
use crate::database::models::{Comment, Forum, Group, User};
use crate::error::ApiError;
use crate::services::poll_service::{self, PollView};

/// Profile reads, profile updates and the "my stuff" listings.
pub struct UserService {
    users: UserDao,
    forums: ForumDao,
    comments: CommentDao,
    polls: PollDao,
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub gender: Option<String>,
    pub university: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserService {
    pub fn new(ctx: &SharedContext) -> Self {
        Self {
            users: UserDao::new(ctx.db.clone()),
            forums: ForumDao::new(ctx.db.clone()),
            comments: CommentDao::new(ctx.db.clone()),
            polls: PollDao::new(ctx.db.clone()),
        }
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ApiError> {
        Ok(self.users.get_active(id).await?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User, ApiError> {
        self.users
            .find_active_by_username(username)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, ApiError> {
        let user = self
            .users
            .update_profile(
                user_id,
                update.gender.as_deref(),
                update.university.as_deref(),
                update.avatar_url.as_deref(),
            )
            .await?;

        info!(user_id = %user_id, "Profile updated");
        Ok(user)
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.users.soft_delete(user_id).await?;
        info!(user_id = %user_id, "Account deleted");
        Ok(())
    }

    pub async fn forums_by_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<Paginated<Forum>, ApiError> {
        self.users.get_active(user_id).await?;
        let (items, total) = self.forums.list_by_author(user_id, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn comments_by_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<Paginated<Comment>, ApiError> {
        self.users.get_active(user_id).await?;
        let (items, total) = self.comments.list_by_author(user_id, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn polls_by_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<Paginated<PollView>, ApiError> {
        self.users.get_active(user_id).await?;
        let (polls, total) = self.polls.list_by_author(user_id, page).await?;
        let views = poll_service::attach_options(&self.polls, polls).await?;
        Ok(Paginated::new(views, page, total))
    }

    pub async fn groups_of_user(
        &self,
        user_id: Uuid,
        page: Page,
    ) -> Result<Paginated<Group>, ApiError> {
        self.users.get_active(user_id).await?;
        let (items, total) = self.users.groups_for_member(user_id, page).await?;
        Ok(Paginated::new(items, page, total))
    }
}
