use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{Page, Paginated};
use crate::context::SharedContext;
use crate::database::daos::{MediaDao, UserDao};
use crate::database::models::Media;
use crate::error::ApiError;

const OWNER_TYPES: &[&str] = &["forum", "comment", "user", "group", "poll"];

pub struct MediaService {
    media: MediaDao,
    users: UserDao,
    ctx: SharedContext,
}

/// One file lifted out of a multipart request.
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// The entity an upload is attached to, when declared by the client.
#[derive(Debug, Clone)]
pub struct MediaOwner {
    pub owner_type: String,
    pub owner_id: Uuid,
}

pub fn validate_owner_type(owner_type: &str) -> Result<(), ApiError> {
    if OWNER_TYPES.contains(&owner_type) {
        Ok(())
    } else {
        Err(ApiError::validation_error(
            format!("Unknown owner type '{}'", owner_type),
            None,
        ))
    }
}

/// Strip a client-supplied file name down to a safe component: the last path
/// segment, with anything outside [A-Za-z0-9._-] replaced.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_matches(['.', '_']).to_string();
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed
    }
}

pub fn file_extension(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())
}

/// Content type for storage: what the client declared, or a guess from the
/// extension, or octet-stream.
fn resolve_content_type(declared: Option<&str>, extension: Option<&str>) -> String {
    if let Some(ct) = declared {
        if !ct.is_empty() {
            return ct.to_string();
        }
    }
    match extension {
        Some("png") => mime::IMAGE_PNG.to_string(),
        Some("jpg") | Some("jpeg") => mime::IMAGE_JPEG.to_string(),
        Some("gif") => mime::IMAGE_GIF.to_string(),
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}

impl MediaService {
    pub fn new(ctx: SharedContext) -> Self {
        Self {
            media: MediaDao::new(ctx.db.clone()),
            users: UserDao::new(ctx.db.clone()),
            ctx,
        }
    }

    /// Validate and persist a single upload, returning the stored record.
    pub async fn upload(
        &self,
        uploader_id: Uuid,
        file: UploadedFile,
        owner: Option<MediaOwner>,
        description: Option<String>,
    ) -> Result<Media, ApiError> {
        self.users.get_active(uploader_id).await?;

        if let Some(owner) = &owner {
            validate_owner_type(&owner.owner_type)?;
        }
        if file.bytes.is_empty() {
            return Err(ApiError::validation_error("Empty file", None));
        }
        if file.bytes.len() > self.ctx.config.media.max_upload_bytes {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds the {} byte upload limit",
                self.ctx.config.media.max_upload_bytes
            )));
        }

        let extension = file_extension(&file.original_name);
        let allowed = &self.ctx.config.media.allowed_extensions;
        match &extension {
            Some(ext) if allowed.contains(ext) => {}
            _ => {
                return Err(ApiError::validation_error(
                    format!("File type not allowed, expected one of: {}", allowed.join(", ")),
                    None,
                ))
            }
        }

        let now = Utc::now();
        let media_id = Uuid::new_v4();
        let safe_name = sanitize_file_name(&file.original_name);
        let file_name = format!("{}-{}", media_id, safe_name);
        let owner_segment = owner
            .as_ref()
            .map(|o| o.owner_type.clone())
            .unwrap_or_else(|| "misc".to_string());
        let storage_key = format!(
            "{}/{}/{}",
            owner_segment,
            now.format("%Y/%m/%d"),
            file_name
        );

        let content_type = resolve_content_type(file.content_type.as_deref(), extension.as_deref());
        let size_bytes = file.bytes.len() as i64;

        let url = self
            .ctx
            .storage
            .put(&storage_key, file.bytes, &content_type)
            .await?;

        let media = Media {
            id: media_id,
            uploader_id,
            file_name,
            original_file_name: file.original_name,
            mime_type: content_type,
            size_bytes: Some(size_bytes),
            url,
            storage_key,
            backend: self.ctx.storage.name().to_string(),
            owner_type: owner.as_ref().map(|o| o.owner_type.clone()),
            owner_id: owner.map(|o| o.owner_id),
            description,
            created_at: now,
            updated_at: now,
            is_active: true,
        };

        self.media.insert(&media).await?;
        info!(media_id = %media.id, uploader_id = %uploader_id, key = %media.storage_key, "Media uploaded");
        Ok(media)
    }

    /// Upload a batch, best effort per file: a bad file is logged and
    /// skipped, and the call fails only when nothing could be stored.
    pub async fn upload_many(
        &self,
        uploader_id: Uuid,
        files: Vec<UploadedFile>,
        owner: Option<MediaOwner>,
        description: Option<String>,
    ) -> Result<Vec<Media>, ApiError> {
        if files.is_empty() {
            return Err(ApiError::validation_error("No files supplied", None));
        }

        let mut uploaded = Vec::new();
        for file in files {
            let name = file.original_name.clone();
            match self
                .upload(uploader_id, file, owner.clone(), description.clone())
                .await
            {
                Ok(media) => uploaded.push(media),
                Err(e) => warn!("Skipping file '{}': {}", name, e),
            }
        }

        if uploaded.is_empty() {
            return Err(ApiError::validation_error(
                "None of the files could be uploaded",
                None,
            ));
        }
        Ok(uploaded)
    }

    /// Delete a stored object and its record. The backend delete is best
    /// effort: a storage failure is logged and the record is still retired,
    /// so user-facing flows never block on the object store.
    pub async fn delete(&self, media_id: Uuid, actor_id: Uuid) -> Result<(), ApiError> {
        let media = self.media.get_active(media_id).await?;

        if media.uploader_id != actor_id {
            let actor = self.users.get_active(actor_id).await?;
            if !actor.is_admin() {
                return Err(ApiError::forbidden("Not allowed to delete this file"));
            }
        }

        if media.backend == self.ctx.storage.name() {
            if let Err(e) = self.ctx.storage.delete(&media.storage_key).await {
                warn!(media_id = %media_id, "Storage delete failed, continuing: {}", e);
            }
        } else {
            warn!(
                media_id = %media_id,
                backend = %media.backend,
                "Record belongs to a different storage backend, skipping object delete"
            );
        }

        self.media.soft_delete(media_id).await?;
        info!(media_id = %media_id, actor_id = %actor_id, "Media deleted");
        Ok(())
    }

    /// A retrievable URL: presigned for S3-backed records, the stable public
    /// path otherwise.
    pub async fn file_url(&self, media_id: Uuid) -> Result<String, ApiError> {
        let media = self.media.get_active(media_id).await?;

        if media.backend == "s3" && self.ctx.storage.name() == "s3" {
            let expires = Duration::from_secs(self.ctx.config.media.presign_expiry_secs);
            Ok(self.ctx.storage.url(&media.storage_key, expires).await?)
        } else {
            Ok(media.url)
        }
    }

    pub async fn by_owner(
        &self,
        owner_type: &str,
        owner_id: Uuid,
    ) -> Result<Vec<Media>, ApiError> {
        validate_owner_type(owner_type)?;
        Ok(self.media.list_by_owner(owner_type, owner_id).await?)
    }

    pub async fn by_uploader(
        &self,
        uploader_id: Uuid,
        page: Page,
    ) -> Result<Paginated<Media>, ApiError> {
        self.users.get_active(uploader_id).await?;
        let (items, total) = self.media.list_by_uploader(uploader_id, page).await?;
        Ok(Paginated::new(items, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("photo.png"), "photo.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_file_name("..."), "file");
        assert_eq!(sanitize_file_name("C:\\temp\\cat.gif"), "cat.gif");
    }

    #[test]
    fn extensions_are_lowercased() {
        assert_eq!(file_extension("photo.PNG").as_deref(), Some("png"));
        assert_eq!(file_extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn content_type_falls_back_to_extension() {
        assert_eq!(
            resolve_content_type(Some("image/webp"), Some("png")),
            "image/webp"
        );
        assert_eq!(resolve_content_type(None, Some("jpg")), "image/jpeg");
        assert_eq!(
            resolve_content_type(None, Some("bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn owner_types_are_validated() {
        assert!(validate_owner_type("forum").is_ok());
        assert!(validate_owner_type("poll").is_ok());
        assert!(validate_owner_type("message").is_err());
    }
}
