//! Cove - A lightweight content showcase system

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cove::{
    api::{self, middleware::RequestStats, AppState},
    backend::BackendHandle,
    cache::create_cache,
    config::Config,
    repositories::{RestBannerRepository, RestMediaRepository, RestModelRepository},
    services::{
        BannerService, DashboardService, ImportService, LoginRateLimiter, MediaService,
        ModelService, SessionService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cove=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cove showcase system...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Connect the hosted backend. An unconfigured handle still starts;
    // data endpoints degrade until credentials arrive via settings.
    let backend = Arc::new(BackendHandle::from_config(&config.backend));
    if backend.is_configured() {
        tracing::info!(source = backend.status().source.as_str(), "Backend configured");
    } else {
        tracing::warn!("Backend not configured, serving placeholder responses");
    }

    // Initialize cache
    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    // Create repositories
    let model_repo = RestModelRepository::boxed(backend.clone());
    let media_repo = RestMediaRepository::boxed(backend.clone());
    let banner_repo = RestBannerRepository::boxed(backend.clone());

    // Initialize services
    let model_service = Arc::new(ModelService::new(model_repo.clone(), cache.clone()));
    let media_service = Arc::new(MediaService::new(
        media_repo.clone(),
        backend.clone(),
        cache.clone(),
    ));
    let banner_service = Arc::new(BannerService::new(banner_repo, cache.clone()));
    let dashboard_service = Arc::new(DashboardService::new(model_repo.clone(), media_repo.clone()));
    let import_service = Arc::new(ImportService::new(model_repo, media_repo, cache.clone()));

    let session_service = SessionService::new(chrono::Duration::minutes(
        config.session.idle_minutes,
    ));
    let rate_limiter = Arc::new(LoginRateLimiter::new());

    // Build application state
    let request_stats = Arc::new(RequestStats::new());

    let state = AppState {
        backend,
        model_service,
        media_service,
        banner_service,
        dashboard_service,
        import_service,
        session_service: session_service.clone(),
        rate_limiter: rate_limiter.clone(),
        upload_config: Arc::new(config.upload.clone()),
        request_stats,
    };

    // Sweep expired sessions so abandoned ones do not pile up
    {
        let sessions = session_service.clone();
        let interval = config.session.sweep_interval_seconds;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(tokio::time::Duration::from_secs(interval));
            loop {
                ticker.tick().await;
                let removed = sessions.cleanup().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired sessions");
                }
            }
        });
    }

    // Rate limiter cleanup task (runs every 5 minutes)
    {
        let limiter = rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
