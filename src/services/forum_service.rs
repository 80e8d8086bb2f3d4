use std::collections::HashMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::api::{Page, Paginated};
use crate::context::SharedContext;
use crate::database::daos::forum_dao::ForumFilter;
use crate::database::daos::{
    CommentDao, ForumDao, ReactionDao, ReactionKind, ReactionSubject, UserDao,
};
use crate::database::daos::reaction_dao::ReactionCounts;
use crate::database::models::comment::CommentThread;
use crate::database::models::Forum;
use crate::error::ApiError;

pub struct ForumService {
    forums: ForumDao,
    comments: CommentDao,
    users: UserDao,
    reactions: ReactionDao,
}

#[derive(Debug)]
pub struct NewForum {
    pub title: String,
    pub description: Option<String>,
    pub photo_urls: Vec<String>,
    pub university: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct ForumUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct ForumListQuery {
    pub category: Option<String>,
    pub university: Option<String>,
    pub search: Option<String>,
}

/// Parse a client-supplied reaction kind, shared by forum and comment
/// reaction endpoints.
pub fn parse_reaction_kind(kind: &str) -> Result<ReactionKind, ApiError> {
    match kind {
        "like" => Ok(ReactionKind::Like),
        "dislike" => Ok(ReactionKind::Dislike),
        other => Err(ApiError::validation_error(
            format!("Unknown reaction kind '{}'", other),
            None,
        )),
    }
}

impl ForumService {
    pub fn new(ctx: &SharedContext) -> Self {
        Self {
            forums: ForumDao::new(ctx.db.clone()),
            comments: CommentDao::new(ctx.db.clone()),
            users: UserDao::new(ctx.db.clone()),
            reactions: ReactionDao::new(ctx.db.clone()),
        }
    }

    pub async fn create(&self, author_id: Uuid, new: NewForum) -> Result<Forum, ApiError> {
        let author = self.users.get_active(author_id).await?;

        let now = Utc::now();
        let forum = Forum {
            id: Uuid::new_v4(),
            author_id,
            title: new.title,
            description: new.description,
            photo_urls: new.photo_urls,
            like_count: 0,
            dislike_count: 0,
            comment_count: 0,
            // Default to the author's own university when not set explicitly
            university: new.university.or(author.university),
            category: new.category,
            created_at: now,
            updated_at: now,
            is_active: true,
        };

        self.forums.insert(&forum).await?;
        info!(forum_id = %forum.id, author_id = %author_id, "Forum created");
        Ok(forum)
    }

    pub async fn get(&self, id: Uuid) -> Result<Forum, ApiError> {
        Ok(self.forums.get_active(id).await?)
    }

    pub async fn list(
        &self,
        query: &ForumListQuery,
        page: Page,
    ) -> Result<Paginated<Forum>, ApiError> {
        let filter = ForumFilter {
            category: query.category.as_deref(),
            university: query.university.as_deref(),
            search: query.search.as_deref(),
        };
        let (items, total) = self.forums.list(&filter, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    /// Update is owner-only; admins moderate through deletion, not edits.
    pub async fn update(
        &self,
        id: Uuid,
        actor_id: Uuid,
        update: ForumUpdate,
    ) -> Result<Forum, ApiError> {
        let forum = self.forums.get_active(id).await?;

        if forum.author_id != actor_id {
            return Err(ApiError::forbidden("Not allowed to edit this forum"));
        }

        let forum = self
            .forums
            .update(
                id,
                update.title.as_deref(),
                update.description.as_deref(),
                update.photo_urls.as_deref(),
                update.category.as_deref(),
            )
            .await?;

        info!(forum_id = %id, "Forum updated");
        Ok(forum)
    }

    /// Delete by the owner or an admin. The forum's comments go with it, so
    /// the comments listing of a deleted forum is empty, not orphaned.
    pub async fn delete(&self, id: Uuid, actor_id: Uuid) -> Result<(), ApiError> {
        let forum = self.forums.get_active(id).await?;

        if forum.author_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to delete this forum"));
            }
        }

        self.forums.soft_delete_with_comments(id).await?;
        info!(forum_id = %id, actor_id = %actor_id, "Forum deleted");
        Ok(())
    }

    /// Top-level comments with their replies attached.
    pub async fn comments(
        &self,
        forum_id: Uuid,
        page: Page,
    ) -> Result<Paginated<CommentThread>, ApiError> {
        self.forums.get_active(forum_id).await?;

        let (top_level, total) = self.comments.list_top_level(forum_id, page).await?;
        let parent_ids: Vec<Uuid> = top_level.iter().map(|c| c.id).collect();
        let replies = self.comments.replies_for_parents(&parent_ids).await?;

        let mut by_parent: HashMap<Uuid, Vec<_>> = HashMap::new();
        for reply in replies {
            if let Some(parent_id) = reply.parent_id {
                by_parent.entry(parent_id).or_default().push(reply);
            }
        }

        let threads = top_level
            .into_iter()
            .map(|comment| {
                let replies = by_parent.remove(&comment.id).unwrap_or_default();
                CommentThread { comment, replies }
            })
            .collect();

        Ok(Paginated::new(threads, page, total))
    }

    pub async fn react(
        &self,
        forum_id: Uuid,
        user_id: Uuid,
        kind: &str,
    ) -> Result<ReactionCounts, ApiError> {
        let kind = parse_reaction_kind(kind)?;
        self.forums.get_active(forum_id).await?;

        let counts = self
            .reactions
            .apply(ReactionSubject::Forum, forum_id, user_id, kind)
            .await?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_kind_parses_known_values() {
        assert!(matches!(parse_reaction_kind("like"), Ok(ReactionKind::Like)));
        assert!(matches!(
            parse_reaction_kind("dislike"),
            Ok(ReactionKind::Dislike)
        ));
    }

    #[test]
    fn reaction_kind_rejects_unknown_values() {
        assert!(parse_reaction_kind("love").is_err());
        assert!(parse_reaction_kind("").is_err());
    }
}
