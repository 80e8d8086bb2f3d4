use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::api::{Page, Paginated};
use crate::context::SharedContext;
use crate::database::daos::reaction_dao::ReactionCounts;
use crate::database::daos::{
    CommentDao, ForumDao, ReactionDao, ReactionSubject, UserDao,
};
use crate::database::models::Comment;
use crate::error::ApiError;
use crate::services::forum_service::parse_reaction_kind;

pub struct CommentService {
    comments: CommentDao,
    forums: ForumDao,
    users: UserDao,
    reactions: ReactionDao,
}

#[derive(Debug)]
pub struct NewComment {
    pub forum_id: Uuid,
    pub body: String,
    pub photo_urls: Vec<String>,
    pub parent_id: Option<Uuid>,
}

impl CommentService {
    pub fn new(ctx: &SharedContext) -> Self {
        Self {
            comments: CommentDao::new(ctx.db.clone()),
            forums: ForumDao::new(ctx.db.clone()),
            users: UserDao::new(ctx.db.clone()),
            reactions: ReactionDao::new(ctx.db.clone()),
        }
    }

    /// Create a comment. The parent forum must exist; a reply's parent
    /// comment must exist and belong to the same forum. The forum's comment
    /// counter is bumped in the same transaction as the insert.
    pub async fn create(&self, author_id: Uuid, new: NewComment) -> Result<Comment, ApiError> {
        self.users.get_active(author_id).await?;

        self.forums
            .find_active(new.forum_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Forum not found"))?;

        if let Some(parent_id) = new.parent_id {
            let parent = self
                .comments
                .find_active(parent_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Parent comment not found"))?;

            if parent.forum_id != new.forum_id {
                return Err(ApiError::validation_error(
                    "Parent comment belongs to a different forum",
                    None,
                ));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            forum_id: new.forum_id,
            author_id,
            parent_id: new.parent_id,
            body: new.body,
            photo_urls: new.photo_urls,
            like_count: 0,
            dislike_count: 0,
            created_at: now,
            updated_at: now,
            is_active: true,
        };

        self.comments.insert_with_counter(&comment).await?;
        info!(comment_id = %comment.id, forum_id = %comment.forum_id, "Comment created");
        Ok(comment)
    }

    pub async fn get(&self, id: Uuid) -> Result<Comment, ApiError> {
        Ok(self.comments.get_active(id).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        body: Option<String>,
        photo_urls: Option<Vec<String>>,
    ) -> Result<Comment, ApiError> {
        let comment = self.comments.get_active(id).await?;

        if comment.author_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to edit this comment"));
            }
        }

        let comment = self
            .comments
            .update(id, body.as_deref(), photo_urls.as_deref())
            .await?;

        info!(comment_id = %id, "Comment updated");
        Ok(comment)
    }

    /// Deletion is allowed to the comment author, the owner of the forum it
    /// sits on, and moderators/admins.
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), ApiError> {
        let comment = self.comments.get_active(id).await?;

        let permitted = if comment.author_id == actor_id {
            true
        } else if let Some(forum) = self.forums.find_active(comment.forum_id).await? {
            forum.author_id == actor_id || self.users.get_active(actor_id).await?.is_moderator()
        } else {
            self.users.get_active(actor_id).await?.is_moderator()
        };

        if !permitted {
            return Err(ApiError::forbidden("Not allowed to delete this comment"));
        }

        self.comments.soft_delete(id).await?;
        info!(comment_id = %id, actor_id = %actor_id, "Comment deleted");
        Ok(())
    }

    pub async fn replies(&self, id: Uuid, page: Page) -> Result<Paginated<Comment>, ApiError> {
        self.comments.get_active(id).await?;
        let (items, total) = self.comments.list_replies(id, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn react(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        kind: &str,
    ) -> Result<ReactionCounts, ApiError> {
        let kind = parse_reaction_kind(kind)?;
        self.comments.get_active(comment_id).await?;

        let counts = self
            .reactions
            .apply(ReactionSubject::Comment, comment_id, user_id, kind)
            .await?;
        Ok(counts)
    }
}
