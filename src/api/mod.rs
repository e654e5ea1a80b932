//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP API endpoints for the Cove showcase
//! system:
//! - Public routes: health, profiles, showcase pages, media feed,
//!   active banners
//! - Auth routes: login, logout, current session
//! - Admin routes (session-guarded): dashboard, catalog management,
//!   media search, bulk import, uploads, banners, backend settings

pub mod auth;
pub mod banners;
pub mod dashboard;
pub mod media;
pub mod middleware;
pub mod models;
pub mod settings;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedSession, RequestStats};

/// Response for the liveness endpoint
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Whether backend credentials are currently active
    backend_configured: bool,
}

/// GET /api/v1/health - Liveness check
///
/// Always answers, even in placeholder mode; `backend_configured`
/// tells the client whether data endpoints will work.
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        backend_configured: state.backend.is_configured(),
    })
}

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (session-guarded; every request re-arms the idle deadline)
    let admin_routes = Router::new()
        .merge(dashboard::router())
        .nest("/models", models::admin_router())
        .nest("/media", media::admin_router())
        .route("/import", axum::routing::post(media::import_media))
        .nest("/upload", upload::router())
        .nest("/banners", banners::admin_router())
        .nest("/settings", settings::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Auth routes that themselves require a live session
    let protected_auth = auth::protected_router().route_layer(
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth),
    );

    // Public routes
    Router::new()
        .route("/health", get(health))
        .nest("/models", models::public_router())
        .nest("/media", media::public_router())
        .nest("/banners", banners::public_router())
        .nest("/auth", auth::public_router())
        .nest("/auth", protected_auth)
        .nest("/admin", admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS with credentials so the cookie-based session works cross-origin
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
