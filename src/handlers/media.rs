use axum::{
    extract::{Multipart, Path, Query, State},
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
use crate::services::media_service::{MediaOwner, MediaService, UploadedFile};

pub fn routes() -> Router<SharedContext> {
    Router::new()
        .route("/upload", post(upload))
        .route("/upload-multiple", post(upload_multiple))
        .route("/delete", post(delete_media))
        .route("/url", post(media_url))
        .route("/by-owner/:owner_type/:owner_id", get(media_by_owner))
        .route("/user/:user_id", get(media_by_user))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MediaIdRequest {
    pub media_id: Uuid,
}

/// Everything collected out of a multipart upload body: the files plus the
/// optional owner/description text fields.
struct UploadForm {
    files: Vec<UploadedFile>,
    owner_type: Option<String>,
    owner_id: Option<Uuid>,
    description: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm {
        files: Vec::new(),
        owner_type: None,
        owner_id: None,
        description: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") | Some("files") => {
                let original_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| "file".to_string());
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {}", e)))?
                    .to_vec();
                form.files.push(UploadedFile {
                    original_name,
                    content_type,
                    bytes,
                });
            }
            Some("owner_type") => {
                form.owner_type = Some(read_text(field).await?);
            }
            Some("owner_id") => {
                let raw = read_text(field).await?;
                let id = raw
                    .parse::<Uuid>()
                    .map_err(|_| ApiError::validation_error("owner_id must be a UUID", None))?;
                form.owner_id = Some(id);
            }
            Some("description") => {
                form.description = Some(read_text(field).await?);
            }
            _ => {} // unknown fields are ignored
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart field: {}", e)))
}

impl UploadForm {
    /// owner_type and owner_id must be supplied together or not at all.
    fn owner(&self) -> Result<Option<MediaOwner>, ApiError> {
        match (&self.owner_type, &self.owner_id) {
            (Some(owner_type), Some(owner_id)) => Ok(Some(MediaOwner {
                owner_type: owner_type.clone(),
                owner_id: *owner_id,
            })),
            (None, None) => Ok(None),
            _ => Err(ApiError::validation_error(
                "owner_type and owner_id must be supplied together",
                None,
            )),
        }
    }
}

/// POST /api/media/upload - Upload a single file (multipart)
///
/// Fields: `file` (required), `owner_type`+`owner_id` (optional pair),
/// `description` (optional). Oversized payloads return 413, disallowed
/// extensions 400.
async fn upload(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = read_upload_form(multipart).await?;
    let owner = form.owner()?;

    let mut files = form.files;
    let file = match files.len() {
        0 => return Err(ApiError::validation_error("Missing 'file' field", None)),
        1 => files.remove(0),
        _ => {
            return Err(ApiError::validation_error(
                "Use /media/upload-multiple for more than one file",
                None,
            ))
        }
    };

    let media = MediaService::new(ctx)
        .upload(user.user_id, file, owner, form.description)
        .await?;

    Ok(ApiResponse::created(json!({ "media": media })))
}

/// POST /api/media/upload-multiple - Upload a batch of files (multipart)
///
/// Per-file best effort: files that fail validation are skipped and logged;
/// the request fails only when nothing could be stored.
async fn upload_multiple(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Value> {
    let form = read_upload_form(multipart).await?;
    let owner = form.owner()?;

    let media = MediaService::new(ctx)
        .upload_many(user.user_id, form.files, owner, form.description)
        .await?;

    Ok(ApiResponse::created(json!({ "media": media })))
}

/// POST /api/media/delete - Delete an upload (uploader or admin)
///
/// The backend object delete is best-effort; the record is retired even if
/// the object store is unreachable.
async fn delete_media(
    State(ctx): State<SharedContext>,
    user: AuthUser,
    Json(req): Json<MediaIdRequest>,
) -> ApiResult<Value> {
    MediaService::new(ctx).delete(req.media_id, user.user_id).await?;
    Ok(ApiResponse::success(json!({ "message": "File deleted" })))
}

/// POST /api/media/url - Retrievable URL for a stored file
///
/// Presigned and time-limited for S3-backed records, a stable public path
/// for locally stored ones.
async fn media_url(
    State(ctx): State<SharedContext>,
    _user: AuthUser,
    Json(req): Json<MediaIdRequest>,
) -> ApiResult<Value> {
    let url = MediaService::new(ctx).file_url(req.media_id).await?;
    Ok(ApiResponse::success(json!({ "url": url })))
}

/// GET /api/media/by-owner/:owner_type/:owner_id - Files attached to an entity
async fn media_by_owner(
    State(ctx): State<SharedContext>,
    _user: AuthUser,
    Path((owner_type, owner_id)): Path<(String, Uuid)>,
) -> ApiResult<Value> {
    let media = MediaService::new(ctx).by_owner(&owner_type, owner_id).await?;
    Ok(ApiResponse::success(json!({ "media": media })))
}

/// GET /api/media/user/:user_id - Files uploaded by a user
async fn media_by_user(
    State(ctx): State<SharedContext>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl serde::Serialize> {
    let page = query.resolve(&ctx.config.api);
    let media = MediaService::new(ctx).by_uploader(user_id, page).await?;
    Ok(ApiResponse::success(media))
}
