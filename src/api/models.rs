//! Model profile API endpoints
//!
//! Handles HTTP requests for profiles:
//! - GET /api/v1/models - Public profile list
//! - GET /api/v1/models/{slug} - Public showcase page data
//! - GET /api/v1/admin/models - Admin catalog with quality filters
//! - POST/PUT/DELETE /api/v1/admin/models - Profile management

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::models::{Media, Model, ModelPatch};
use crate::services::gallery::Lightbox;
use crate::services::model::{CatalogFilter, CatalogPage, ModelDraft, ModelServiceError};

/// Query parameters for the admin catalog listing
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

/// Query parameters for the public showcase page
#[derive(Debug, Default, Deserialize)]
pub struct ShowcaseQuery {
    /// Deep-linked slide index, clamped into range
    #[serde(default)]
    pub slide: Option<usize>,
}

/// Initial gallery state for a showcase page
#[derive(Debug, Serialize)]
pub struct GalleryState {
    /// Clamped slide the viewer should open on
    pub slide: usize,
    pub total: usize,
}

/// Public showcase page data: the profile, its media and where the
/// lightbox should start
#[derive(Debug, Serialize)]
pub struct ShowcaseResponse {
    pub model: Model,
    pub media: Vec<Media>,
    pub gallery: GalleryState,
}

/// Build the public model routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_models))
        .route("/{slug}", get(get_showcase))
}

/// Build the admin model routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_catalog))
        .route("/", post(create_model))
        .route("/{id}", put(update_model))
        .route("/{id}", delete(delete_model))
}

fn map_error(err: ModelServiceError) -> ApiError {
    match err {
        ModelServiceError::Validation(msg) => ApiError::validation_error(msg),
        ModelServiceError::NotFound(msg) => ApiError::not_found(msg),
        ModelServiceError::Backend(err) => err.into(),
    }
}

/// GET /api/v1/models - List all public profiles
async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<Model>>, ApiError> {
    let models = state.model_service.list_public().await.map_err(map_error)?;
    Ok(Json(models))
}

/// GET /api/v1/models/{slug} - Showcase page data for one profile
///
/// `?slide=` deep-links into the gallery; out-of-range values are
/// clamped to the last slide rather than rejected.
async fn get_showcase(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ShowcaseQuery>,
) -> Result<Json<ShowcaseResponse>, ApiError> {
    let model = state
        .model_service
        .get_by_slug(&slug)
        .await
        .map_err(map_error)?
        .ok_or_else(|| ApiError::not_found(format!("No profile with slug '{}'", slug)))?;

    let media = state
        .media_service
        .list_for_model(model.id)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let mut lightbox = Lightbox::new(media.len());
    lightbox.open_at(query.slide.unwrap_or(0));

    Ok(Json(ShowcaseResponse {
        gallery: GalleryState {
            slide: lightbox.index(),
            total: lightbox.len(),
        },
        model,
        media,
    }))
}

/// GET /api/v1/admin/models - Admin catalog with quality filters
///
/// `filter` accepts `all`, `missing-avatar` or `missing-bio`; `q`
/// searches name and bio. Stats always cover the whole catalog.
async fn list_catalog(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPage>, ApiError> {
    let filter = match query.filter.as_deref() {
        None => CatalogFilter::All,
        Some(raw) => raw
            .parse::<CatalogFilter>()
            .map_err(ApiError::validation_error)?,
    };

    let page = state
        .model_service
        .list_catalog(filter, query.q.as_deref())
        .await
        .map_err(map_error)?;

    Ok(Json(page))
}

/// POST /api/v1/admin/models - Create a profile
async fn create_model(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Json(draft): Json<ModelDraft>,
) -> Result<(StatusCode, Json<Model>), ApiError> {
    let model = state.model_service.create(draft).await.map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(model)))
}

/// PUT /api/v1/admin/models/{id} - Update a profile
async fn update_model(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Path(id): Path<i64>,
    Json(patch): Json<ModelPatch>,
) -> Result<Json<Model>, ApiError> {
    let model = state
        .model_service
        .update(id, patch)
        .await
        .map_err(map_error)?;
    Ok(Json(model))
}

/// DELETE /api/v1/admin/models/{id} - Delete a profile
async fn delete_model(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.model_service.delete(id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}
