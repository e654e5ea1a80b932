//! Upload API endpoints
//!
//! Handles file uploads for media items, profile imagery and banner
//! assets. Files go straight to the hosted backend's object storage;
//! nothing is written to the local disk.

use axum::{
    extract::{Multipart, Query, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::backend::storage::object_name;
use crate::backend::ObjectStorage;

/// Query parameters for an upload
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Target storage bucket
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Optional object-name prefix (e.g. `avatar`, `cover`)
    #[serde(default)]
    pub prefix: Option<String>,
}

fn default_bucket() -> String {
    "media".to_string()
}

/// Response for successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URL of the stored object
    pub url: String,
    /// Object path inside the bucket
    pub path: String,
    pub size: u64,
    pub content_type: String,
}

/// Build the upload router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload_file))
}

/// POST /api/v1/admin/upload?bucket= - Upload a single file
///
/// Accepts multipart/form-data with a single file field named "file".
/// The object is stored with upsert semantics and the public URL is
/// returned for use in media/banner rows.
async fn upload_file(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &state.upload_config;

    if !config.is_bucket_allowed(&query.bucket) {
        return Err(ApiError::validation_error(format!(
            "Unknown storage bucket '{}'. Allowed buckets: {:?}",
            query.bucket, config.buckets
        )));
    }

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "file" {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "upload".to_string());

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        if !config.is_type_allowed(&content_type) {
            return Err(ApiError::validation_error(format!(
                "Invalid file type: {}. Allowed types: {:?}",
                content_type, config.allowed_types
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::internal_error(format!("Failed to read file: {}", e)))?;

        if data.len() as u64 > config.max_file_size {
            return Err(ApiError::validation_error(format!(
                "File too large. Maximum size: {} bytes ({} MB)",
                config.max_file_size,
                config.max_file_size / 1024 / 1024
            )));
        }

        let path = object_name(
            query.prefix.as_deref(),
            &filename,
            Utc::now().timestamp_millis(),
        );

        let url = state
            .backend
            .upload(&query.bucket, &path, &content_type, data.to_vec())
            .await
            .map_err(ApiError::from)?;

        return Ok(Json(UploadResponse {
            url,
            path,
            size: data.len() as u64,
            content_type,
        }));
    }

    Err(ApiError::validation_error("No file provided"))
}
