//! REST client for the hosted backend
//!
//! Speaks the PostgREST dialect for table reads and writes, plus the storage
//! and password-auth endpoints of the same host. Provider failures are mapped
//! to the typed `ErrorKind` taxonomy here so no caller ever has to sniff
//! error message strings.
//!
//! Requests are cancellation-safe: dropping a caller's future aborts the
//! underlying HTTP request.

use reqwest::{header, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{
    AuthUser, BackendError, Credentials, ErrorKind, Filter, MutateRequest, QueryResult,
    SelectRequest,
};

/// Per-request timeout; slow backends should fail loudly, not hang handlers
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on provider error text carried into our own error messages
const ERROR_SNIPPET_MAX: usize = 300;

/// HTTP client bound to one credential pair.
///
/// A client built without credentials is the placeholder: every call returns
/// `ErrorKind::NotConfigured` before any network activity.
pub struct RestClient {
    http: reqwest::Client,
    creds: Option<Credentials>,
}

impl RestClient {
    pub fn new(http: reqwest::Client, creds: Credentials) -> Self {
        Self {
            http,
            creds: Some(creds),
        }
    }

    pub fn placeholder(http: reqwest::Client) -> Self {
        Self { http, creds: None }
    }

    fn creds(&self) -> Result<&Credentials, BackendError> {
        self.creds.as_ref().ok_or_else(BackendError::not_configured)
    }

    fn rest_url(&self, creds: &Credentials, table: &str) -> String {
        format!("{}/rest/v1/{}", creds.url, table)
    }

    fn storage_url(&self, creds: &Credentials, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", creds.url, bucket, path)
    }

    /// Public URL for a stored object
    pub fn public_object_url(&self, bucket: &str, path: &str) -> Result<String, BackendError> {
        let creds = self.creds()?;
        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            creds.url, bucket, path
        ))
    }

    // ------------------------------------------------------------------
    // Tables
    // ------------------------------------------------------------------

    /// Run a select against one table
    pub async fn select(&self, req: &SelectRequest) -> Result<QueryResult, BackendError> {
        let creds = self.creds()?;

        let mut request = self
            .http
            .get(self.rest_url(creds, &req.table))
            .timeout(REQUEST_TIMEOUT)
            .query(&select_query_pairs(req))
            .header("apikey", &creds.key)
            .header(header::AUTHORIZATION, format!("Bearer {}", creds.key));

        if req.exact_count {
            request = request.header("Prefer", "count=exact");
        }
        if req.single {
            request = request.header(header::ACCEPT, "application/vnd.pgrst.object+json");
        }

        let response = request.send().await.map_err(transport_error)?;
        read_result(response).await
    }

    /// Run an insert, update or delete against one table
    pub async fn mutate(&self, req: &MutateRequest) -> Result<QueryResult, BackendError> {
        let creds = self.creds()?;

        let request = match req {
            MutateRequest::Insert { table, row } => self
                .http
                .post(self.rest_url(creds, table))
                .timeout(REQUEST_TIMEOUT)
                .header("apikey", &creds.key)
                .header(header::AUTHORIZATION, format!("Bearer {}", creds.key))
                .header("Prefer", "return=representation")
                .json(row),
            MutateRequest::Update { table, id, patch } => self
                .http
                .patch(self.rest_url(creds, table))
                .timeout(REQUEST_TIMEOUT)
                .query(&[("id", format!("eq.{}", id))])
                .header("apikey", &creds.key)
                .header(header::AUTHORIZATION, format!("Bearer {}", creds.key))
                .header("Prefer", "return=representation")
                .json(patch),
            MutateRequest::Delete { table, id } => self
                .http
                .delete(self.rest_url(creds, table))
                .timeout(REQUEST_TIMEOUT)
                .query(&[("id", format!("eq.{}", id))])
                .header("apikey", &creds.key)
                .header(header::AUTHORIZATION, format!("Bearer {}", creds.key)),
        };

        let response = request.send().await.map_err(transport_error)?;
        read_result(response).await
    }

    // ------------------------------------------------------------------
    // Storage
    // ------------------------------------------------------------------

    /// Upload a file and return its public URL
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let creds = self.creds()?;

        let response = self
            .http
            .post(self.storage_url(creds, bucket, path))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &creds.key)
            .header(header::AUTHORIZATION, format!("Bearer {}", creds.key))
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_provider_error(status, &body));
        }

        self.public_object_url(bucket, path)
    }

    /// Remove a stored file
    pub async fn remove_object(&self, bucket: &str, path: &str) -> Result<(), BackendError> {
        let creds = self.creds()?;

        let response = self
            .http
            .delete(self.storage_url(creds, bucket, path))
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &creds.key)
            .header(header::AUTHORIZATION, format!("Bearer {}", creds.key))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_provider_error(status, &body));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    /// Password sign-in; credential checks stay on the hosted backend
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        let creds = self.creds()?;

        let response = self
            .http
            .post(format!("{}/auth/v1/token", creds.url))
            .timeout(REQUEST_TIMEOUT)
            .query(&[("grant_type", "password")])
            .header("apikey", &creds.key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_sign_in_error(status, &body));
        }

        let grant: PasswordGrant = response.json().await.map_err(|e| {
            BackendError::unknown(format!("failed to decode sign-in response: {}", e))
        })?;
        Ok(grant.user)
    }
}

#[derive(Debug, Deserialize)]
struct PasswordGrant {
    user: AuthUser,
}

/// Error body shape used by the backend's REST and storage endpoints
#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    code: Option<String>,
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::unknown(format!("backend request timed out: {}", e))
    } else {
        BackendError::unknown(format!("backend request failed: {}", e))
    }
}

/// Parse status, count header and body into a `QueryResult`
async fn read_result(response: reqwest::Response) -> Result<QueryResult, BackendError> {
    let status = response.status();
    let total = response
        .headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range_total);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(map_provider_error(status, &body));
    }

    // Deletes answer 204 with no body
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::unknown(format!("failed to read backend response: {}", e)))?;
    let rows = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|e| {
            BackendError::unknown(format!("failed to parse backend response: {}", e))
        })?
    };

    Ok(QueryResult { rows, total })
}

/// Total row count from a `Content-Range` header like `0-4/123`
fn parse_content_range_total(value: &str) -> Option<i64> {
    let total = value.rsplit('/').next()?;
    total.trim().parse().ok()
}

/// Map a provider error body to the typed taxonomy.
///
/// Postgres error codes and their schema-cache equivalents are checked
/// first; the message text is only consulted for older providers that
/// surface raw `does not exist` errors without a usable code.
fn map_provider_error(status: StatusCode, body: &str) -> BackendError {
    let parsed: ProviderError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("backend returned status {}", status)
            } else {
                snippet(body)
            }
        });

    let kind = classify(parsed.code.as_deref(), &message, status);
    BackendError::new(kind, message)
}

fn classify(code: Option<&str>, message: &str, status: StatusCode) -> ErrorKind {
    match code {
        Some("PGRST116") => return ErrorKind::NotFound,
        Some("42P01") | Some("PGRST205") => return ErrorKind::RelationMissing,
        Some("42703") | Some("PGRST204") => return ErrorKind::ColumnMissing,
        _ => {}
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ErrorKind::Unauthorized;
    }

    let lower = message.to_lowercase();
    if lower.contains("does not exist") {
        if lower.contains("column") {
            return ErrorKind::ColumnMissing;
        }
        if lower.contains("relation") || lower.contains("table") {
            return ErrorKind::RelationMissing;
        }
    }
    if lower.contains("could not find the table") {
        return ErrorKind::RelationMissing;
    }

    if status == StatusCode::NOT_FOUND {
        return ErrorKind::NotFound;
    }

    ErrorKind::Unknown
}

/// Sign-in failures: bad credentials come back as 400 from the auth endpoint
fn map_sign_in_error(status: StatusCode, body: &str) -> BackendError {
    let parsed: ProviderError = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .unwrap_or_else(|| "sign-in failed".to_string());

    let kind = if matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    ) {
        ErrorKind::Unauthorized
    } else {
        ErrorKind::Unknown
    };
    BackendError::new(kind, message)
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_SNIPPET_MAX {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_SNIPPET_MAX).collect();
        format!("{}...", cut)
    }
}

/// Query string for a select request, in PostgREST syntax
fn select_query_pairs(req: &SelectRequest) -> Vec<(String, String)> {
    let mut pairs = vec![("select".to_string(), req.columns.clone())];

    for filter in &req.filters {
        match filter {
            Filter::Eq(column, value) => pairs.push((column.clone(), format!("eq.{}", value))),
            Filter::Ilike(column, pattern) => {
                pairs.push((column.clone(), format!("ilike.{}", pattern)))
            }
            Filter::Gte(column, value) => pairs.push((column.clone(), format!("gte.{}", value))),
        }
    }

    if let Some(order) = &req.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        pairs.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    if let Some(limit) = req.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // Query building
    // ============================================================================

    #[test]
    fn test_select_query_pairs_full_request() {
        let req = SelectRequest::table("media")
            .columns("*,models(nome)")
            .ilike("descricao", "*beach*")
            .eq("tipo", "photo")
            .gte("created_at", "2024-01-01T00:00:00Z")
            .order_desc("created_at")
            .limit(50);

        let pairs = select_query_pairs(&req);

        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*,models(nome)".to_string()),
                ("descricao".to_string(), "ilike.*beach*".to_string()),
                ("tipo".to_string(), "eq.photo".to_string()),
                (
                    "created_at".to_string(),
                    "gte.2024-01-01T00:00:00Z".to_string()
                ),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_query_pairs_defaults_to_star() {
        let pairs = select_query_pairs(&SelectRequest::table("models"));
        assert_eq!(pairs, vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn test_select_query_pairs_ascending_order() {
        let req = SelectRequest::table("banners").order_asc("ordem");
        let pairs = select_query_pairs(&req);
        assert!(pairs.contains(&("order".to_string(), "ordem.asc".to_string())));
    }

    // ============================================================================
    // Content-Range parsing
    // ============================================================================

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-4/123"), Some(123));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    // ============================================================================
    // Error classification
    // ============================================================================

    #[test]
    fn test_missing_relation_by_code() {
        let err = map_provider_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"42P01","message":"relation \"public.banners\" does not exist"}"#,
        );
        assert_eq!(err.kind, ErrorKind::RelationMissing);

        let err = map_provider_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"PGRST205","message":"Could not find the table 'public.banners' in the schema cache"}"#,
        );
        assert_eq!(err.kind, ErrorKind::RelationMissing);
    }

    #[test]
    fn test_missing_column_by_code() {
        let err = map_provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":"42703","message":"column \"publicar_em\" of relation \"media\" does not exist"}"#,
        );
        assert_eq!(err.kind, ErrorKind::ColumnMissing);

        let err = map_provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":"PGRST204","message":"Could not find the 'publicar_em' column of 'media' in the schema cache"}"#,
        );
        assert_eq!(err.kind, ErrorKind::ColumnMissing);
    }

    #[test]
    fn test_missing_schema_by_message_only() {
        // Older providers surface raw Postgres text without a usable code
        let err = map_provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"message":"column media.publicar_em does not exist"}"#,
        );
        assert_eq!(err.kind, ErrorKind::ColumnMissing);

        let err = map_provider_error(
            StatusCode::BAD_REQUEST,
            r#"{"message":"relation \"banners\" does not exist"}"#,
        );
        assert_eq!(err.kind, ErrorKind::RelationMissing);
    }

    #[test]
    fn test_single_object_miss_is_not_found() {
        let err = map_provider_error(
            StatusCode::NOT_ACCEPTABLE,
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        );
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_unauthorized_by_status() {
        let err = map_provider_error(StatusCode::UNAUTHORIZED, r#"{"message":"JWT expired"}"#);
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message, "JWT expired");

        let err = map_provider_error(StatusCode::FORBIDDEN, "");
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    #[test]
    fn test_plain_404_is_not_found() {
        let err = map_provider_error(StatusCode::NOT_FOUND, r#"{"message":"Object not found"}"#);
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_unparseable_body_falls_back_to_snippet() {
        let err = map_provider_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_empty_body_reports_status() {
        let err = map_provider_error(StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.kind, ErrorKind::Unknown);
        assert!(err.message.contains("502"));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let err = map_provider_error(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(err.message.len() < 400);
        assert!(err.message.ends_with("..."));
    }

    #[test]
    fn test_sign_in_error_maps_bad_credentials() {
        let err = map_sign_in_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message, "Invalid login credentials");

        let err = map_sign_in_error(
            StatusCode::BAD_REQUEST,
            r#"{"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        assert_eq!(err.kind, ErrorKind::Unauthorized);
    }

    // ============================================================================
    // Placeholder behavior
    // ============================================================================

    #[tokio::test]
    async fn test_placeholder_never_touches_the_network() {
        let client = RestClient::placeholder(reqwest::Client::new());

        let err = client
            .select(&SelectRequest::table("models"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotConfigured);

        let err = client
            .upload_object("media", "x.jpg", "image/jpeg", vec![1, 2, 3])
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotConfigured);

        let err = client.sign_in("a@b.c", "pw").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotConfigured);

        assert!(client.public_object_url("media", "x.jpg").is_err());
    }

    #[test]
    fn test_public_object_url() {
        let creds = Credentials::new("https://abc.supabase.co", "key").unwrap();
        let client = RestClient::new(reqwest::Client::new(), creds);

        assert_eq!(
            client.public_object_url("media", "42_photo.jpg").unwrap(),
            "https://abc.supabase.co/storage/v1/object/public/media/42_photo.jpg"
        );
    }
}
