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
use crate::services::forum_service::{ForumListQuery, ForumService, ForumUpdate, NewForum};

pub fn routes() -> Router<SharedContext> {
    Router::new()
        .route("/", get(list_forums).post(create_forum))
        .route(
            "/:forum_id",
            get(get_forum).put(update_forum).delete(delete_forum),
        )
        .route("/:forum_id/comments", get(forum_comments))
        .route("/:forum_id/react", post(react_to_forum))
}

// Pagination fields are spelled out rather than flattened: serde's flatten
// buffers values as strings, which breaks integer parsing in query strings.
#[derive(Debug, Deserialize)]
pub struct ForumListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
    pub university: Option<String>,
    pub search: Option<String>,
}

impl ForumListParams {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateForumRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    pub university: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateForumRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub photo_urls: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReactionRequest {
    /// "like" or "dislike"
    #[validate(length(min = 1, message = "Reaction kind is required"))]
    pub kind: String,
}

/// GET /api/forums - Paginated forum index with optional filters
async fn list_forums(
    State(ctx): State<SharedContext>,
    Query(params): Query<ForumListParams>,
) -> ApiResult<impl serde::Serialize> {
    let page = params.page_query().resolve(&ctx.config.api);
    let query = ForumListQuery {
        category: params.category,
        university: params.university,
        search: params.search,
    };
    let forums = ForumService::new(&ctx).list(&query, page).await?;
    Ok(ApiResponse::success(forums))
}

/// POST /api/forums - Create a forum owned by the caller
async fn create_forum(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<CreateForumRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let forum = ForumService::new(&ctx)
        .create(
            user.user_id,
            NewForum {
                title: req.title,
                description: req.description,
                photo_urls: req.photo_urls,
                university: req.university,
                category: req.category,
            },
        )
        .await?;

    Ok(ApiResponse::created(json!({ "forum": forum })))
}

/// GET /api/forums/:forum_id
async fn get_forum(
    State(ctx): State<SharedContext>,
    Path(forum_id): Path<Uuid>,
) -> ApiResult<Value> {
    let forum = ForumService::new(&ctx).get(forum_id).await?;
    Ok(ApiResponse::success(json!({ "forum": forum })))
}

/// PUT /api/forums/:forum_id - Owner-only update
async fn update_forum(
    State(ctx): State<SharedContext>,
    Path(forum_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<UpdateForumRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let forum = ForumService::new(&ctx)
        .update(
            forum_id,
            user.user_id,
            ForumUpdate {
                title: req.title,
                description: req.description,
                photo_urls: req.photo_urls,
                category: req.category,
            },
        )
        .await?;

    Ok(ApiResponse::success(json!({ "forum": forum })))
}

/// DELETE /api/forums/:forum_id - Owner or admin; comments go with it
async fn delete_forum(
    State(ctx): State<SharedContext>,
    Path(forum_id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<Value> {
    ForumService::new(&ctx).delete(forum_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Forum deleted" })))
}

/// GET /api/forums/:forum_id/comments - Top-level comments with replies
async fn forum_comments(
    State(ctx): State<SharedContext>,
    Path(forum_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let comments = ForumService::new(&ctx).comments(forum_id, page).await?;
    Ok(ApiResponse::success(comments))
}

/// POST /api/forums/:forum_id/react - Like or dislike a forum
///
/// One reaction per user per forum: repeating the same kind is a 409,
/// switching kind moves the counters.
async fn react_to_forum(
    State(ctx): State<SharedContext>,
    Path(forum_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<ReactionRequest>,
) -> ApiResult<impl serde::Serialize> {
    req.validate().map_err(ApiError::from)?;

    let counts = ForumService::new(&ctx)
        .react(forum_id, user.user_id, &req.kind)
        .await?;
    Ok(ApiResponse::success(counts))
}
