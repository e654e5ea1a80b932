//! Banner API endpoints
//!
//! Handles HTTP requests for the promotional carousel:
//! - GET /api/v1/banners - Active banners, display order ascending
//! - GET /api/v1/admin/banners - Full catalog, or setup SQL when the
//!   backing table does not exist yet
//! - POST/PATCH/DELETE /api/v1/admin/banners - Banner management

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::models::{Banner, BannerPatch, NewBanner};
use crate::services::banner::{BannerPage, BannerServiceError};

/// Build the public banner routes
pub fn public_router() -> Router<AppState> {
    Router::new().route("/", get(list_active))
}

/// Build the admin banner routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admin))
        .route("/", post(create_banner))
        .route("/{id}", patch(update_banner))
        .route("/{id}", delete(delete_banner))
}

fn map_error(err: BannerServiceError) -> ApiError {
    match err {
        BannerServiceError::Validation(msg) => ApiError::validation_error(msg),
        BannerServiceError::NotFound(msg) => ApiError::not_found(msg),
        BannerServiceError::Backend(err) => err.into(),
    }
}

/// GET /api/v1/banners - Active banners for the public carousel
///
/// A missing banners table renders as an empty carousel; the admin
/// listing is where setup instructions surface.
async fn list_active(State(state): State<AppState>) -> Result<Json<Vec<Banner>>, ApiError> {
    let banners = state.banner_service.list_active().await.map_err(map_error)?;
    Ok(Json(banners))
}

/// GET /api/v1/admin/banners - Full banner catalog
///
/// When the banners table is absent the response carries the bootstrap
/// SQL instead of failing, for manual execution in the backend's SQL
/// editor.
async fn list_admin(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<Json<BannerPage>, ApiError> {
    let page = state.banner_service.list_admin().await.map_err(map_error)?;
    Ok(Json(page))
}

/// POST /api/v1/admin/banners - Create a banner
async fn create_banner(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Json(row): Json<NewBanner>,
) -> Result<(StatusCode, Json<Banner>), ApiError> {
    let banner = state.banner_service.create(row).await.map_err(map_error)?;
    Ok((StatusCode::CREATED, Json(banner)))
}

/// PATCH /api/v1/admin/banners/{id} - Update a banner
///
/// Used for toggling `ativo` and reordering as well as edits; only the
/// fields present in the body change.
async fn update_banner(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Path(id): Path<String>,
    Json(body): Json<BannerPatch>,
) -> Result<Json<Banner>, ApiError> {
    let banner = state
        .banner_service
        .update(&id, &body)
        .await
        .map_err(map_error)?;
    Ok(Json(banner))
}

/// DELETE /api/v1/admin/banners/{id} - Delete a banner and its asset
async fn delete_banner(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.banner_service.delete(&id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}
