//! Authentication API endpoints
//!
//! Handles HTTP requests for admin authentication:
//! - POST /api/v1/auth/login - Admin login
//! - POST /api/v1/auth/logout - Manual logout
//! - GET /api/v1/auth/me - Get current session
//!
//! Credential checks are delegated to the hosted backend's password
//! grant; this layer only rate-limits attempts and manages the local
//! idle-timeout session.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::backend::{AuthProvider, ErrorKind};

/// Request body for admin login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub email: String,
    /// Seconds of inactivity before the session expires
    pub idle_seconds: i64,
}

/// Response for the current-session endpoint
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
    pub created_at: String,
    pub deadline: String,
}

impl From<crate::models::Session> for SessionResponse {
    fn from(session: crate::models::Session) -> Self {
        Self {
            email: session.email,
            created_at: session.created_at.to_rfc3339(),
            deadline: session.deadline.to_rfc3339(),
        }
    }
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_session))
}

/// POST /api/v1/auth/login - Admin login
///
/// Rate-limited per email and per source IP. On success, starts an
/// idle-timeout session and sets an HttpOnly session cookie.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation_error("A valid email is required"));
    }

    // IP rate limit first, then the per-email attempt limit
    if let Some(ip) = extract_ip_address(&headers).and_then(|s| s.parse().ok()) {
        if state.rate_limiter.is_ip_limited(ip).await {
            return Err(ApiError::with_details(
                "RATE_LIMIT",
                "Too many requests, try again shortly",
                serde_json::json!({"retry_after": 60}),
            ));
        }
        state.rate_limiter.record_ip_request(ip).await;
    }

    if state.rate_limiter.is_email_limited(&email).await {
        return Err(ApiError::with_details(
            "RATE_LIMIT",
            "Too many failed logins, try again later",
            serde_json::json!({"retry_after": 900}),
        ));
    }

    let user = match state.backend.sign_in(&email, &body.password).await {
        Ok(user) => user,
        Err(err) if err.kind == ErrorKind::Unauthorized => {
            state.rate_limiter.record_failed_attempt(&email).await;
            return Err(ApiError::unauthorized("Invalid email or password"));
        }
        Err(err) if err.kind == ErrorKind::NotConfigured => {
            return Err(ApiError::not_configured());
        }
        Err(err) => return Err(ApiError::internal_error(err.to_string())),
    };

    state.rate_limiter.clear_email_attempts(&email).await;

    let session = state.session_service.create(&user.email).await;
    let idle_seconds = state.session_service.idle_window().num_seconds();

    // HttpOnly so scripts never see the token; Max-Age matches the idle
    // window, the server-side deadline is what actually expires it
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id, idle_seconds
    );
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());

    Ok((
        response_headers,
        Json(AuthResponse {
            token: session.id,
            email: session.email,
            idle_seconds,
        }),
    ))
}

/// POST /api/v1/auth/logout - Manual logout
///
/// Removes the session directly; a manual logout never produces the
/// session-expired notice even when the deadline already passed.
async fn logout(
    State(state): State<AppState>,
    session: AuthenticatedSession,
) -> Result<impl IntoResponse, ApiError> {
    state.session_service.remove(&session.0.id).await;

    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/v1/auth/me - Get current session
async fn get_current_session(session: AuthenticatedSession) -> Json<SessionResponse> {
    Json(session.0.into())
}

/// Extract IP address from request headers.
/// Checks X-Forwarded-For, then X-Real-IP.
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                return Some(ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.1, 10.0.0.2".parse().unwrap());
        headers.insert("x-real-ip", "10.0.0.3".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("10.0.0.1".to_string()));
    }

    #[test]
    fn test_extract_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "10.0.0.3".parse().unwrap());

        assert_eq!(extract_ip_address(&headers), Some("10.0.0.3".to_string()));
    }

    #[test]
    fn test_extract_ip_none() {
        assert_eq!(extract_ip_address(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_response_from_session() {
        let session = crate::models::Session::new(
            "admin@example.com",
            chrono::Utc::now(),
            chrono::Duration::minutes(30),
        );
        let response = SessionResponse::from(session.clone());

        assert_eq!(response.email, "admin@example.com");
        assert_eq!(response.deadline, session.deadline.to_rfc3339());
    }
}
