use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, put},
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
use crate::services::user_service::{ProfileUpdate, UserService};

pub fn routes() -> Router<SharedContext> {
    Router::new()
        // Static segments first; axum prefers them over the :user_id capture
        .route("/profile", put(update_profile))
        .route("/account", delete(delete_account))
        .route("/forums", get(my_forums))
        .route("/comments", get(my_comments))
        .route("/polls", get(my_polls))
        .route("/groups", get(my_groups))
        .route("/by-username/:username", get(get_user_by_username))
        .route("/:user_id", get(get_user))
        .route("/:user_id/forums", get(user_forums))
        .route("/:user_id/comments", get(user_comments))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 32, message = "Gender must be at most 32 characters"))]
    pub gender: Option<String>,
    #[validate(length(max = 128, message = "University must be at most 128 characters"))]
    pub university: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
}

/// GET /api/users/:user_id - Public profile
async fn get_user(
    State(ctx): State<SharedContext>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Value> {
    let user = UserService::new(&ctx).get_user(user_id).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// GET /api/users/by-username/:username - Public profile by username
async fn get_user_by_username(
    State(ctx): State<SharedContext>,
    Path(username): Path<String>,
) -> ApiResult<Value> {
    let user = UserService::new(&ctx).get_user_by_username(&username).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PUT /api/users/profile - Update the caller's profile fields
///
/// Only gender, university and avatar may change here; credentials go
/// through the auth endpoints.
async fn update_profile(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let updated = UserService::new(&ctx)
        .update_profile(
            user.user_id,
            ProfileUpdate {
                gender: req.gender,
                university: req.university,
                avatar_url: req.avatar_url,
            },
        )
        .await?;

    Ok(ApiResponse::success(json!({ "user": updated })))
}

/// DELETE /api/users/account - Soft-delete the caller's account
async fn delete_account(State(ctx): State<SharedContext>, user: AuthUser) -> ApiResult<Value> {
    UserService::new(&ctx).delete_account(user.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Account deleted" })))
}

/// GET /api/users/forums - Forums owned by the caller
async fn my_forums(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let forums = UserService::new(&ctx).forums_by_user(user.user_id, page).await?;
    Ok(ApiResponse::success(forums))
}

/// GET /api/users/comments - Comments authored by the caller
async fn my_comments(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let comments = UserService::new(&ctx)
        .comments_by_user(user.user_id, page)
        .await?;
    Ok(ApiResponse::success(comments))
}

/// GET /api/users/polls - Polls owned by the caller
async fn my_polls(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let polls = UserService::new(&ctx).polls_by_user(user.user_id, page).await?;
    Ok(ApiResponse::success(polls))
}

/// GET /api/users/groups - Groups the caller belongs to
async fn my_groups(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let groups = UserService::new(&ctx).groups_of_user(user.user_id, page).await?;
    Ok(ApiResponse::success(groups))
}

/// GET /api/users/:user_id/forums - Public listing of a user's forums
async fn user_forums(
    State(ctx): State<SharedContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let forums = UserService::new(&ctx).forums_by_user(user_id, page).await?;
    Ok(ApiResponse::success(forums))
}

/// GET /api/users/:user_id/comments - Public listing of a user's comments
async fn user_comments(
    State(ctx): State<SharedContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let comments = UserService::new(&ctx).comments_by_user(user_id, page).await?;
    Ok(ApiResponse::success(comments))
}
