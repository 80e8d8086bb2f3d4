use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::api::PageQuery;
use crate::context::SharedContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, MaybeAuthUser};
use crate::services::group_service::{GroupService, GroupUpdate, NewGroup};

pub fn routes() -> Router<SharedContext> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route(
            "/:group_id",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route("/:group_id/join", post(join_group))
        .route("/:group_id/leave", post(leave_group))
        .route("/:group_id/members", get(group_members))
        .route("/:group_id/members/:user_id/role", put(update_member_role))
        .route("/:group_id/members/:user_id/approve", post(approve_member))
}

// Pagination fields spelled out; serde flatten breaks integer parsing in
// query strings.
#[derive(Debug, Deserialize)]
pub struct GroupListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
}

impl GroupListParams {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    #[validate(length(min = 2, max = 100, message = "Group name must be 2-100 characters"))]
    pub name: String,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    /// "open" (default), "closed" or "secret"
    pub privacy: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateGroupRequest {
    #[validate(length(min = 2, max = 100, message = "Group name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,
    pub privacy: Option<String>,
    pub logo_url: Option<String>,
    pub cover_url: Option<String>,
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MemberListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// "active" (default), "pending" or "banned"; the latter two are
    /// visible to group managers only.
    pub status: Option<String>,
}

impl MemberListParams {
    fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MemberRoleRequest {
    /// "member" or "moderator"
    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApprovalRequest {
    pub approve: bool,
}

/// GET /api/groups - Public group index (secret groups are not listed)
async fn list_groups(
    State(ctx): State<SharedContext>,
    Query(params): Query<GroupListParams>,
) -> ApiResult<impl serde::Serialize> {
    let page = params.page_query().resolve(&ctx.config.api);
    let groups = GroupService::new(&ctx)
        .list(params.search.as_deref(), page)
        .await?;
    Ok(ApiResponse::success(groups))
}

/// POST /api/groups - Create a group; the caller becomes its owner member
async fn create_group(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let group = GroupService::new(&ctx)
        .create(
            user.user_id,
            NewGroup {
                name: req.name,
                description: req.description,
                privacy: req.privacy,
                logo_url: req.logo_url,
                cover_url: req.cover_url,
                categories: req.categories,
            },
        )
        .await?;

    Ok(ApiResponse::created(json!({ "group": group })))
}

/// GET /api/groups/:group_id
async fn get_group(
    State(ctx): State<SharedContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Value> {
    let group = GroupService::new(&ctx).get(group_id).await?;
    Ok(ApiResponse::success(json!({ "group": group })))
}

/// PUT /api/groups/:group_id - Owner/moderator member or admin
async fn update_group(
    State(ctx): State<SharedContext>,
    Path(group_id): Path<Uuid>,
    user: AuthUser,
    Json(req): Json<UpdateGroupRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let group = GroupService::new(&ctx)
        .update(
            group_id,
            user.user_id,
            GroupUpdate {
                name: req.name,
                description: req.description,
                privacy: req.privacy,
                logo_url: req.logo_url,
                cover_url: req.cover_url,
                categories: req.categories,
            },
        )
        .await?;

    Ok(ApiResponse::success(json!({ "group": group })))
}

/// DELETE /api/groups/:group_id - Group owner or admin
async fn delete_group(
    State(ctx): State<SharedContext>,
    Path(group_id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<Value> {
    GroupService::new(&ctx).delete(group_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Group deleted" })))
}

/// POST /api/groups/:group_id/join
///
/// Open groups enroll immediately; closed groups leave the membership
/// pending approval; secret groups cannot be joined from outside.
async fn join_group(
    State(ctx): State<SharedContext>,
    Path(group_id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<impl serde::Serialize> {
    let outcome = GroupService::new(&ctx).join(group_id, user.user_id).await?;
    Ok(ApiResponse::success(outcome))
}

/// POST /api/groups/:group_id/leave - The owner cannot leave
async fn leave_group(
    State(ctx): State<SharedContext>,
    Path(group_id): Path<Uuid>,
    user: AuthUser,
) -> ApiResult<Value> {
    GroupService::new(&ctx).leave(group_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Left the group" })))
}

/// GET /api/groups/:group_id/members
async fn group_members(
    State(ctx): State<SharedContext>,
    Path(group_id): Path<Uuid>,
    Query(params): Query<MemberListParams>,
    viewer: MaybeAuthUser,
) -> ApiResult<impl serde::Serialize> {
    let page = params.page_query().resolve(&ctx.config.api);
    let members = GroupService::new(&ctx)
        .members(
            group_id,
            params.status.as_deref(),
            viewer.0.map(|v| v.user_id),
            page,
        )
        .await?;
    Ok(ApiResponse::success(members))
}

/// PUT /api/groups/:group_id/members/:user_id/role - Owner or admin
async fn update_member_role(
    State(ctx): State<SharedContext>,
    Path((group_id, member_id)): Path<(Uuid, Uuid)>,
    user: AuthUser,
    Json(req): Json<MemberRoleRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let member = GroupService::new(&ctx)
        .update_member_role(group_id, member_id, &req.role, user.user_id)
        .await?;

    Ok(ApiResponse::success(json!({ "member": member })))
}

/// POST /api/groups/:group_id/members/:user_id/approve
///
/// Approve or reject a pending membership; rejecting removes the row.
async fn approve_member(
    State(ctx): State<SharedContext>,
    Path((group_id, member_id)): Path<(Uuid, Uuid)>,
    user: AuthUser,
    Json(req): Json<ApprovalRequest>,
) -> ApiResult<Value> {
    let member = GroupService::new(&ctx)
        .decide_membership(group_id, member_id, req.approve, user.user_id)
        .await?;

    let body = match member {
        Some(member) => json!({ "member": member }),
        None => json!({ "message": "Membership rejected" }),
    };
    Ok(ApiResponse::success(body))
}
