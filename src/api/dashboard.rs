//! Admin dashboard API endpoints
//!
//! Handles HTTP requests for the admin landing page:
//! - GET /api/v1/admin/dashboard - Catalog metrics and upload history
//! - GET /api/v1/admin/stats - Process/system resource stats

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::process;
use sysinfo::{Pid, System};

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::backend::ErrorKind;
use crate::services::dashboard::{Dashboard, DashboardError};

/// Response for system stats (memory usage, uptime, request counters)
#[derive(Debug, Serialize)]
pub struct SystemStatsResponse {
    /// App version
    pub version: String,
    /// Process memory usage in bytes
    pub memory_bytes: u64,
    /// Process memory usage formatted (e.g., "45.2 MB")
    pub memory_formatted: String,
    /// System total memory in bytes
    pub system_total_memory: u64,
    /// System used memory in bytes
    pub system_used_memory: u64,
    /// Operating system name
    pub os_name: String,
    /// Process uptime in seconds
    pub uptime_seconds: u64,
    /// Uptime formatted (e.g., "2h 15m")
    pub uptime_formatted: String,
    /// Total requests processed
    pub total_requests: u64,
    /// Average response time in milliseconds
    pub avg_response_time_ms: f64,
    /// Live admin sessions
    pub active_sessions: usize,
}

/// App version constant - update when releasing
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the dashboard router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/stats", get(get_system_stats))
}

/// GET /api/v1/admin/dashboard - Get dashboard metrics
///
/// All panels load together; any failing query fails the whole
/// response, so the page never shows a mix of fresh and stale numbers.
async fn get_dashboard(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<Json<Dashboard>, ApiError> {
    let dashboard = state.dashboard_service.load().await.map_err(|e| match e {
        DashboardError::Backend(err) if err.kind == ErrorKind::NotConfigured => {
            ApiError::not_configured()
        }
        DashboardError::Backend(err) => {
            ApiError::internal_error(format!("Failed to load dashboard data: {}", err))
        }
    })?;

    Ok(Json(dashboard))
}

/// GET /api/v1/admin/stats - Get system resource stats
///
/// Returns memory usage and request statistics for the current process.
async fn get_system_stats(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<Json<SystemStatsResponse>, ApiError> {
    let mut sys = System::new_all();
    sys.refresh_all();

    let pid = Pid::from_u32(process::id());

    let memory_bytes = if let Some(proc) = sys.process(pid) {
        proc.memory()
    } else {
        0
    };

    let memory_formatted = format_bytes(memory_bytes);

    let system_total_memory = sys.total_memory();
    let system_used_memory = sys.used_memory();

    let os_name = System::name().unwrap_or_else(|| "Unknown".to_string());

    let uptime_seconds = state.request_stats.uptime_seconds();
    let uptime_formatted = format_uptime(uptime_seconds);
    let total_requests = state.request_stats.total_requests();
    let avg_response_time_ms = state.request_stats.avg_response_time_us() / 1000.0;
    let active_sessions = state.session_service.active_count().await;

    Ok(Json(SystemStatsResponse {
        version: APP_VERSION.to_string(),
        memory_bytes,
        memory_formatted,
        system_total_memory,
        system_used_memory,
        os_name,
        uptime_seconds,
        uptime_formatted,
        total_requests,
        avg_response_time_ms,
        active_sessions,
    }))
}

/// Format uptime to human readable string
fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

/// Format bytes to human readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
