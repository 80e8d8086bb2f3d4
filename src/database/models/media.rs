use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const BACKEND_S3: &str = "s3";
pub const BACKEND_LOCAL: &str = "local";

/// Record of an uploaded file. `storage_key` locates the object inside the
/// configured backend; `url` is the public (or served) address.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Media {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub file_name: String,
    pub original_file_name: String,
    pub mime_type: String,
    pub size_bytes: Option<i64>,
    pub url: String,
    pub storage_key: String,
    pub backend: String,
    pub owner_type: Option<String>,
    pub owner_id: Option<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}
