use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::PageQuery;
use crate::context::SharedContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::comment_service::{CommentService, NewComment};

use super::forums::ReactionRequest;

pub fn routes() -> Router<SharedContext> {
    Router::new()
        .route("/", post(create_comment))
        .route(
            "/:comment_id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
        .route("/:comment_id/replies", get(comment_replies))
        .route("/:comment_id/react", post(react_to_comment))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub forum_id: Uuid,
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1-5000 characters"))]
    pub body: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    /// Set when replying to another comment of the same forum.
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1-5000 characters"))]
    pub body: Option<String>,
    pub photo_urls: Option<Vec<String>>,
}

/// POST /api/comments - Comment on a forum (or reply to a comment)
///
/// The referenced forum must exist (404 otherwise); the forum's comment
/// counter moves in the same transaction as the insert.
async fn create_comment(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let comment = CommentService::new(&ctx)
        .create(
            user.user_id,
            NewComment {
                forum_id: req.forum_id,
                body: req.body,
                photo_urls: req.photo_urls,
                parent_id: req.parent_id,
            },
        )
        .await?;

    Ok(ApiResponse::created(json!({ "comment": comment })))
}

/// GET /api/comments/:comment_id
async fn get_comment(
    State(ctx): State<SharedContext>,
    Path(comment_id): Path<Uuid>,
) -> ApiResult<Value> {
    let comment = CommentService::new(&ctx).get(comment_id).await?;
    Ok(ApiResponse::success(json!({ "comment": comment })))
}

/// PUT /api/comments/:comment_id - Author or admin
async fn update_comment(
    State(ctx): State<SharedContext>,
    Path(comment_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let comment = CommentService::new(&ctx)
        .update(comment_id, user.user_id, req.body, req.photo_urls)
        .await?;

    Ok(ApiResponse::success(json!({ "comment": comment })))
}

/// DELETE /api/comments/:comment_id - Author, forum owner or moderator
async fn delete_comment(
    State(ctx): State<SharedContext>,
    Path(comment_id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<Value> {
    CommentService::new(&ctx)
        .delete(comment_id, user.user_id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Comment deleted" })))
}

/// GET /api/comments/:comment_id/replies
async fn comment_replies(
    State(ctx): State<SharedContext>,
    Path(comment_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let replies = CommentService::new(&ctx).replies(comment_id, page).await?;
    Ok(ApiResponse::success(replies))
}

/// POST /api/comments/:comment_id/react - Like or dislike a comment
async fn react_to_comment(
    State(ctx): State<SharedContext>,
    Path(comment_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<ReactionRequest>,
) -> ApiResult<impl serde::Serialize> {
    req.validate().map_err(ApiError::from)?;

    let counts = CommentService::new(&ctx)
        .react(comment_id, user.user_id, &req.kind)
        .await?;
    Ok(ApiResponse::success(counts))
}
