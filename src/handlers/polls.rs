use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::PageQuery;
use crate::context::SharedContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::poll_service::{NewPoll, PollListQuery, PollService, PollUpdate};

pub fn routes() -> Router<SharedContext> {
    Router::new()
        .route("/", get(list_polls).post(create_poll))
        .route(
            "/:poll_id",
            get(get_poll).put(update_poll).delete(delete_poll),
        )
        .route("/:poll_id/vote", post(vote))
        .route("/:poll_id/results", get(results))
}

// Pagination fields spelled out; serde flatten breaks integer parsing in
// query strings.
#[derive(Debug, Deserialize)]
pub struct PollListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category: Option<String>,
    pub university: Option<String>,
    /// true = open polls only, false = closed polls only
    pub open: Option<bool>,
}

impl PollListParams {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreatePollRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 2, message = "A poll needs at least two options"))]
    pub options: Vec<String>,
    pub closes_at: Option<DateTime<Utc>>,
    pub university: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdatePollRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub category: Option<String>,
    pub closes_at: Option<DateTime<Utc>>,
    /// Replacing the options discards all existing votes.
    #[validate(length(min = 2, message = "A poll needs at least two options"))]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VoteRequest {
    pub option_id: Uuid,
}

/// GET /api/polls - Paginated poll index with optional filters
async fn list_polls(
    State(ctx): State<SharedContext>,
    Query(params): Query<PollListParams>,
) -> ApiResult<impl serde::Serialize> {
    let page = params.page_query().resolve(&ctx.config.api);
    let query = PollListQuery {
        category: params.category,
        university: params.university,
        open: params.open,
    };
    let polls = PollService::new(&ctx).list(&query, page).await?;
    Ok(ApiResponse::success(polls))
}

/// POST /api/polls - Create a poll with its options
async fn create_poll(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<CreatePollRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let poll = PollService::new(&ctx)
        .create(
            user.user_id,
            NewPoll {
                title: req.title,
                description: req.description,
                options: req.options,
                closes_at: req.closes_at,
                university: req.university,
                category: req.category,
            },
        )
        .await?;

    Ok(ApiResponse::created(json!({ "poll": poll })))
}

/// GET /api/polls/:poll_id
async fn get_poll(State(ctx): State<SharedContext>, Path(poll_id): Path<Uuid>) -> ApiResult<Value> {
    let poll = PollService::new(&ctx).get(poll_id).await?;
    Ok(ApiResponse::success(json!({ "poll": poll })))
}

/// PUT /api/polls/:poll_id - Owner or admin
async fn update_poll(
    State(ctx): State<SharedContext>,
    Path(poll_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<UpdatePollRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let poll = PollService::new(&ctx)
        .update(
            poll_id,
            user.user_id,
            PollUpdate {
                title: req.title,
                description: req.description,
                category: req.category,
                closes_at: req.closes_at,
                options: req.options,
            },
        )
        .await?;

    Ok(ApiResponse::success(json!({ "poll": poll })))
}

/// DELETE /api/polls/:poll_id - Owner or admin
async fn delete_poll(
    State(ctx): State<SharedContext>,
    Path(poll_id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<Value> {
    PollService::new(&ctx).delete(poll_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Poll deleted" })))
}

/// POST /api/polls/:poll_id/vote - Cast the caller's single vote
///
/// A second vote on the same poll returns 409 and changes nothing; the
/// response carries the tallied results after the vote.
async fn vote(
    State(ctx): State<SharedContext>,
    Path(poll_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<VoteRequest>,
) -> ApiResult<impl serde::Serialize> {
    req.validate().map_err(ApiError::from)?;

    let results = PollService::new(&ctx)
        .vote(poll_id, user.user_id, req.option_id)
        .await?;
    Ok(ApiResponse::success(results))
}

/// GET /api/polls/:poll_id/results - Options with their vote counts
async fn results(
    State(ctx): State<SharedContext>,
    Path(poll_id): Path<Uuid>,
) -> ApiResult<impl serde::Serialize> {
    let results = PollService::new(&ctx).results(poll_id).await?;
    Ok(ApiResponse::success(results))
}
