//! Media API endpoints
//!
//! Handles HTTP requests for media items:
//! - GET /api/v1/media - Public home feed
//! - GET /api/v1/admin/media - Admin search with filters
//! - POST /api/v1/admin/media - Register an uploaded file as a row
//! - DELETE /api/v1/admin/media/{id} - Delete row plus stored file
//! - POST /api/v1/admin/import - Bulk import from exporter JSON

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::models::{Media, MediaType, NewMedia};
use crate::repositories::MediaFilter;
use crate::services::import::{ImportError, ImportOutcome, ImportPayload, ImportTarget};
use crate::services::media::MediaServiceError;

/// Query parameters for the admin media search
#[derive(Debug, Default, Deserialize)]
pub struct MediaSearchQuery {
    /// Case-insensitive caption match
    #[serde(default)]
    pub q: Option<String>,
    /// `photo` or `video`
    #[serde(default)]
    pub tipo: Option<String>,
    /// Restrict to one profile
    #[serde(default)]
    pub model_id: Option<i64>,
}

/// Request body for a bulk import.
///
/// Carries the exporter document plus the target: an existing profile
/// id, an explicit name for a new profile, or neither (the name is then
/// derived from the document's hints).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    #[serde(default)]
    pub model_id: Option<i64>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(flatten)]
    pub payload: ImportPayload,
}

/// Build the public media routes
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(home_feed))
}

/// Build the admin media routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_media))
        .route("/", post(create_media))
        .route("/{id}", delete(delete_media))
}

fn map_error(err: MediaServiceError) -> ApiError {
    match err {
        MediaServiceError::Validation(msg) => ApiError::validation_error(msg),
        MediaServiceError::NotFound(msg) => ApiError::not_found(msg),
        MediaServiceError::Backend(err) => err.into(),
    }
}

/// GET /api/v1/media - Newest items across all profiles
async fn home_feed(State(state): State<AppState>) -> Result<Json<Vec<Media>>, ApiError> {
    let feed = state.media_service.home_feed().await.map_err(map_error)?;
    Ok(Json(feed))
}

/// GET /api/v1/admin/media - Search the media catalog
async fn search_media(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Query(query): Query<MediaSearchQuery>,
) -> Result<Json<Vec<Media>>, ApiError> {
    let tipo = match query.tipo.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(
            raw.parse::<MediaType>()
                .map_err(ApiError::validation_error)?,
        ),
    };

    let filter = MediaFilter {
        text: query.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
        tipo,
        model_id: query.model_id,
        ..MediaFilter::default()
    };

    let items = state.media_service.search(&filter).await.map_err(map_error)?;
    Ok(Json(items))
}

/// POST /api/v1/admin/media - Register a media row
///
/// The file itself is uploaded separately; this records the resulting
/// public URL against a profile.
async fn create_media(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Json(row): Json<NewMedia>,
) -> Result<(StatusCode, Json<Media>), ApiError> {
    let created = state.media_service.create(row).await.map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/v1/admin/media/{id} - Delete an item and its stored file
async fn delete_media(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.media_service.delete(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/import - Bulk import media
///
/// The outcome lists any items stored without their publish schedule
/// (backend schema missing the scheduling column), so the admin sees
/// the downgrade instead of it happening silently.
pub async fn import_media(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ImportOutcome>, ApiError> {
    let target = match body.model_id {
        Some(id) => ImportTarget::Existing(id),
        None => ImportTarget::New {
            name: body.model_name,
        },
    };

    let outcome = state
        .import_service
        .run(target, body.payload)
        .await
        .map_err(|e| match e {
            ImportError::Validation(msg) => ApiError::validation_error(msg),
            ImportError::NotFound(msg) => ApiError::not_found(msg),
            ImportError::Backend(err) => err.into(),
        })?;

    Ok(Json(outcome))
}
