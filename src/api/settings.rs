//! Settings API endpoints
//!
//! Handles the runtime backend-credential override:
//! - GET /api/v1/admin/settings/backend - Active credential status
//! - PUT /api/v1/admin/settings/backend - Install an override
//! - DELETE /api/v1/admin/settings/backend - Clear the override
//!
//! The anon key is accepted on writes but never echoed back.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedSession};
use crate::backend::CredentialStatus;

/// Request body for installing a credential override
#[derive(Debug, Deserialize)]
pub struct BackendSettingsRequest {
    pub url: String,
    pub anon_key: String,
}

/// Response describing the active credentials (key redacted)
#[derive(Debug, Serialize)]
pub struct BackendSettingsResponse {
    /// `override`, `config` or `unset`
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub configured: bool,
}

impl From<CredentialStatus> for BackendSettingsResponse {
    fn from(status: CredentialStatus) -> Self {
        Self {
            source: status.source.as_str().to_string(),
            configured: status.url.is_some(),
            url: status.url,
        }
    }
}

/// Build the settings router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/backend", get(get_backend_settings))
        .route("/backend", put(set_backend_settings))
        .route("/backend", delete(clear_backend_settings))
}

/// GET /api/v1/admin/settings/backend - Active credential status
async fn get_backend_settings(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Json<BackendSettingsResponse> {
    Json(state.backend.status().into())
}

/// PUT /api/v1/admin/settings/backend - Install a credential override
///
/// The override persists across restarts and takes precedence over the
/// configuration file until cleared. Installing it invalidates the
/// memoized backend client, so the next query uses the new credentials.
async fn set_backend_settings(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
    Json(body): Json<BackendSettingsRequest>,
) -> Result<Json<BackendSettingsResponse>, ApiError> {
    state
        .backend
        .set_override(&body.url, &body.anon_key)
        .map_err(|e| ApiError::validation_error(e.to_string()))?;

    Ok(Json(state.backend.status().into()))
}

/// DELETE /api/v1/admin/settings/backend - Clear the override
///
/// Falls back to the configured credentials, or to placeholder mode
/// when none are configured.
async fn clear_backend_settings(
    State(state): State<AppState>,
    _session: AuthenticatedSession,
) -> Result<(StatusCode, Json<BackendSettingsResponse>), ApiError> {
    state
        .backend
        .clear_override()
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok((StatusCode::OK, Json(state.backend.status().into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CredentialSource;

    #[test]
    fn test_response_never_carries_the_key() {
        let status = CredentialStatus {
            source: CredentialSource::Config,
            url: Some("https://abc.supabase.co".to_string()),
        };
        let response = BackendSettingsResponse::from(status);
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("abc.supabase.co"));
        assert!(!json.contains("key"));
        assert_eq!(response.source, "config");
        assert!(response.configured);
    }

    #[test]
    fn test_unset_response() {
        let status = CredentialStatus {
            source: CredentialSource::Unset,
            url: None,
        };
        let response = BackendSettingsResponse::from(status);

        assert_eq!(response.source, "unset");
        assert!(!response.configured);
        assert!(response.url.is_none());
    }
}
