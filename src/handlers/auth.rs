use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::context::SharedContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::auth_service::{AuthService, Registration};

pub fn routes() -> Router<SharedContext> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/refresh-token", post(refresh_token))
        .route("/change-password", post(change_password))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub gender: Option<String>,
    pub university: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// POST /api/auth/register - Create an account and receive a JWT
///
/// Expected Input:
/// ```json
/// {
///   "email": "string",      // Required: unique among active accounts
///   "username": "string",   // Required: unique among active accounts
///   "password": "string",   // Required: at least 8 characters
///   "gender": "string",     // Optional
///   "university": "string"  // Optional
/// }
/// ```
///
/// Returns 201 with `{ "user": {...}, "token": "..." }`; registering an
/// email or username that is already taken yields 409.
async fn register(
    State(ctx): State<SharedContext>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let result = AuthService::new(ctx)
        .register(Registration {
            email: req.email,
            username: req.username,
            password: req.password,
            gender: req.gender,
            university: req.university,
        })
        .await?;

    Ok(ApiResponse::created(json!({
        "user": result.user,
        "token": result.token,
    })))
}

/// POST /api/auth/login - Authenticate and receive a JWT
///
/// Invalid email, wrong password and disabled accounts all return the same
/// 401 so the endpoint leaks nothing about which part failed.
async fn login(
    State(ctx): State<SharedContext>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let result = AuthService::new(ctx).login(&req.email, &req.password).await?;

    Ok(ApiResponse::success(json!({
        "user": result.user,
        "token": result.token,
    })))
}

/// GET /api/auth/me - The authenticated user's own account
async fn me(State(ctx): State<SharedContext>, user: AuthUser) -> ApiResult<Value> {
    let current = AuthService::new(ctx).current_user(user.user_id).await?;
    Ok(ApiResponse::success(json!({ "user": current })))
}

/// POST /api/auth/refresh-token - Fresh JWT for an active session
async fn refresh_token(State(ctx): State<SharedContext>, user: AuthUser) -> ApiResult<Value> {
    let token = AuthService::new(ctx).refresh_token(user.user_id).await?;
    Ok(ApiResponse::success(json!({ "token": token })))
}

/// POST /api/auth/change-password - Rotate the password, verifying the old one
async fn change_password(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    AuthService::new(ctx)
        .change_password(user.user_id, &req.current_password, &req.new_password)
        .await?;

    Ok(ApiResponse::success(json!({ "message": "Password changed" })))
}

/// POST /api/auth/forgot-password - Start a password reset
///
/// Always answers 200 regardless of whether the address exists, so accounts
/// cannot be enumerated. In development the reset token is included in the
/// response since no mail delivery is wired up.
async fn forgot_password(
    State(ctx): State<SharedContext>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    let token = AuthService::new(ctx).forgot_password(&req.email).await?;

    let mut body = json!({ "message": "If the address exists, reset instructions were sent" });
    if let Some(token) = token {
        body["reset_token"] = json!(token);
    }
    Ok(ApiResponse::success(body))
}

/// POST /api/auth/reset-password - Complete a password reset
async fn reset_password(
    State(ctx): State<SharedContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Value> {
    req.validate().map_err(ApiError::from)?;

    AuthService::new(ctx)
        .reset_password(&req.token, &req.new_password)
        .await?;

    Ok(ApiResponse::success(json!({ "message": "Password reset" })))
}
