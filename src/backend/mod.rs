//! Hosted backend integration
//!
//! All persistence, file storage and credential checks are delegated to a
//! hosted backend exposing PostgREST-style tables, object storage and a
//! password sign-in endpoint. This module defines:
//! - The `Backend`, `ObjectStorage` and `AuthProvider` traits the rest of
//!   the system depends on
//! - A typed error taxonomy (`ErrorKind`) replacing ad-hoc message sniffing
//! - `BackendHandle`, which resolves credentials (runtime override first,
//!   then configuration), memoizes one REST client per credential pair and
//!   degrades to a placeholder client when no credentials are present

pub mod rest;
pub mod storage;

use anyhow::Context;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use rest::RestClient;

// ============================================================================
// Error taxonomy
// ============================================================================

/// Classified backend failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested row does not exist
    NotFound,
    /// A referenced table is missing from the backend schema
    RelationMissing,
    /// A referenced column is missing from the backend schema
    ColumnMissing,
    /// The backend rejected our credentials
    Unauthorized,
    /// No credentials are configured; the placeholder client answered
    NotConfigured,
    /// Anything else
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::RelationMissing => "relation missing",
            ErrorKind::ColumnMissing => "column missing",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotConfigured => "not configured",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Error returned by backend operations
#[derive(Debug, Clone, thiserror::Error)]
#[error("backend error ({kind}): {message}")]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_configured() -> Self {
        Self::new(
            ErrorKind::NotConfigured,
            "backend credentials are not configured",
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_missing_relation(&self) -> bool {
        self.kind == ErrorKind::RelationMissing
    }

    pub fn is_missing_column(&self) -> bool {
        self.kind == ErrorKind::ColumnMissing
    }

    pub fn is_not_configured(&self) -> bool {
        self.kind == ErrorKind::NotConfigured
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Backend project URL plus anon key
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
}

impl Credentials {
    /// Normalize and validate a credential pair
    pub fn new(url: &str, key: &str) -> Result<Self, BackendError> {
        let url = url.trim().trim_end_matches('/').to_string();
        let key = key.trim().to_string();
        if url.is_empty() || key.is_empty() {
            return Err(BackendError::new(
                ErrorKind::Unknown,
                "backend url and anon key must not be empty",
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(BackendError::new(
                ErrorKind::Unknown,
                format!("backend url must start with http:// or https://, got '{}'", url),
            ));
        }
        Ok(Self { url, key })
    }
}

// Keys must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("key", &"[redacted]")
            .finish()
    }
}

/// Where the currently active credentials come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Runtime override persisted to disk
    Override,
    /// Configuration file or environment
    Config,
    /// No credentials anywhere; placeholder mode
    Unset,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::Override => "override",
            CredentialSource::Config => "config",
            CredentialSource::Unset => "unset",
        }
    }
}

/// Snapshot of the active credential state, safe to expose over the API
#[derive(Debug, Clone)]
pub struct CredentialStatus {
    pub source: CredentialSource,
    pub url: Option<String>,
}

// ============================================================================
// Query model
// ============================================================================

/// Column filter applied to a select
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Exact match
    Eq(String, String),
    /// Case-insensitive pattern match; the pattern uses `*` wildcards
    Ilike(String, String),
    /// Greater-than-or-equal comparison
    Gte(String, String),
}

/// Sort order for a select
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one backend table
#[derive(Debug, Clone)]
pub struct SelectRequest {
    pub table: String,
    pub columns: String,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
    pub exact_count: bool,
    pub single: bool,
}

impl SelectRequest {
    /// Select `*` from a table
    pub fn table(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            limit: None,
            exact_count: false,
            single: false,
        }
    }

    /// Restrict the selected columns; relationship selects like
    /// `*,models(nome)` are passed through verbatim
    pub fn columns(mut self, columns: &str) -> Self {
        self.columns = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn ilike(mut self, column: &str, pattern: impl Into<String>) -> Self {
        self.filters
            .push(Filter::Ilike(column.to_string(), pattern.into()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Into<String>) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.into()));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: true,
        });
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ask the backend for the exact total row count alongside the rows
    pub fn with_exact_count(mut self) -> Self {
        self.exact_count = true;
        self
    }

    /// Expect exactly one row; zero rows becomes `ErrorKind::NotFound`
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }
}

/// A write against one backend table
#[derive(Debug, Clone)]
pub enum MutateRequest {
    Insert {
        table: String,
        row: serde_json::Value,
    },
    Update {
        table: String,
        id: String,
        patch: serde_json::Value,
    },
    Delete {
        table: String,
        id: String,
    },
}

impl MutateRequest {
    pub fn insert(table: &str, row: serde_json::Value) -> Self {
        Self::Insert {
            table: table.to_string(),
            row,
        }
    }

    pub fn update(table: &str, id: impl fmt::Display, patch: serde_json::Value) -> Self {
        Self::Update {
            table: table.to_string(),
            id: id.to_string(),
            patch,
        }
    }

    pub fn delete(table: &str, id: impl fmt::Display) -> Self {
        Self::Delete {
            table: table.to_string(),
            id: id.to_string(),
        }
    }
}

/// Rows returned by a query, plus the exact total when requested
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: serde_json::Value,
    pub total: Option<i64>,
}

impl QueryResult {
    /// Deserialize the returned rows into a concrete type
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> Result<T, BackendError> {
        serde_json::from_value(self.rows).map_err(|e| {
            BackendError::unknown(format!("failed to decode backend rows: {}", e))
        })
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Read and write access to backend tables
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run a select against one table
    async fn query(&self, req: SelectRequest) -> Result<QueryResult, BackendError>;

    /// Run an insert, update or delete against one table
    async fn mutate(&self, req: MutateRequest) -> Result<QueryResult, BackendError>;

    /// Invalidate any memoized client state after a credential change
    fn credentials_changed(&self);
}

/// File storage on the hosted backend
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a file and return its public URL
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError>;

    /// Remove a stored file
    async fn remove(&self, bucket: &str, path: &str) -> Result<(), BackendError>;
}

/// Password sign-in against the hosted backend
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError>;
}

/// Identity returned by a successful sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

// ============================================================================
// BackendHandle
// ============================================================================

/// Persisted shape of a runtime credential override
#[derive(Debug, Serialize, Deserialize)]
struct StoredOverride {
    url: String,
    anon_key: String,
}

/// Entry point to the hosted backend.
///
/// Resolves credentials with override-first precedence, hands out a memoized
/// `RestClient` for the active pair and falls back to a placeholder client
/// when nothing is configured. The placeholder answers every call with
/// `ErrorKind::NotConfigured` so the rest of the system can degrade instead
/// of crashing at startup.
pub struct BackendHandle {
    http: reqwest::Client,
    configured: Option<Credentials>,
    override_file: PathBuf,
    override_creds: RwLock<Option<Credentials>>,
    client_cache: RwLock<Option<(Credentials, Arc<RestClient>)>>,
    placeholder: Arc<RestClient>,
    placeholder_warned: OnceCell<()>,
}

impl BackendHandle {
    /// Build a handle from configuration, loading any persisted override
    pub fn from_config(config: &BackendConfig) -> Self {
        let http = reqwest::Client::new();

        let configured = match (&config.url, &config.anon_key) {
            (Some(url), Some(key)) => Credentials::new(url, key).ok(),
            _ => None,
        };

        let override_creds = load_override(&config.override_file);
        if override_creds.is_some() {
            info!(
                file = %config.override_file.display(),
                "loaded backend credential override"
            );
        }

        Self {
            placeholder: Arc::new(RestClient::placeholder(http.clone())),
            http,
            configured,
            override_file: config.override_file.clone(),
            override_creds: RwLock::new(override_creds),
            client_cache: RwLock::new(None),
            placeholder_warned: OnceCell::new(),
        }
    }

    /// Active credentials: override first, then configuration
    fn resolve(&self) -> Option<Credentials> {
        let overridden = self
            .override_creds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        overridden.or_else(|| self.configured.clone())
    }

    /// Client for the active credentials.
    ///
    /// The same `RestClient` is returned for as long as the credential pair
    /// stays unchanged; a new pair builds a new client. With no credentials
    /// the shared placeholder client is returned and a warning is logged once.
    pub fn client(&self) -> Arc<RestClient> {
        let Some(creds) = self.resolve() else {
            self.placeholder_warned.get_or_init(|| {
                warn!("backend credentials are not configured; serving placeholder responses");
            });
            return Arc::clone(&self.placeholder);
        };

        {
            let cache = self.client_cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some((cached, client)) = cache.as_ref() {
                if *cached == creds {
                    return Arc::clone(client);
                }
            }
        }

        debug!(url = %creds.url, "building backend client");
        let client = Arc::new(RestClient::new(self.http.clone(), creds.clone()));
        let mut cache = self.client_cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some((creds, Arc::clone(&client)));
        client
    }

    /// Install a runtime credential override and persist it to disk
    pub fn set_override(&self, url: &str, key: &str) -> anyhow::Result<()> {
        let creds = Credentials::new(url, key)?;

        if let Some(parent) = self.override_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory '{}'", parent.display())
                })?;
            }
        }
        let stored = StoredOverride {
            url: creds.url.clone(),
            anon_key: creds.key.clone(),
        };
        let yaml = serde_yaml::to_string(&stored).context("Failed to serialize override")?;
        std::fs::write(&self.override_file, yaml).with_context(|| {
            format!(
                "Failed to write override file '{}'",
                self.override_file.display()
            )
        })?;

        let mut slot = self
            .override_creds
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(creds);
        drop(slot);

        self.credentials_changed();
        info!(url = %url.trim(), "backend credential override installed");
        Ok(())
    }

    /// Remove the runtime override, falling back to configured credentials
    pub fn clear_override(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.override_file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to remove override file '{}'",
                        self.override_file.display()
                    )
                });
            }
        }

        let mut slot = self
            .override_creds
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *slot = None;
        drop(slot);

        self.credentials_changed();
        info!("backend credential override cleared");
        Ok(())
    }

    /// Snapshot for the settings endpoint; never exposes the key
    pub fn status(&self) -> CredentialStatus {
        let overridden = self
            .override_creds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(creds) = overridden {
            return CredentialStatus {
                source: CredentialSource::Override,
                url: Some(creds.url),
            };
        }
        match &self.configured {
            Some(creds) => CredentialStatus {
                source: CredentialSource::Config,
                url: Some(creds.url.clone()),
            },
            None => CredentialStatus {
                source: CredentialSource::Unset,
                url: None,
            },
        }
    }

    /// Whether any credentials are currently active
    pub fn is_configured(&self) -> bool {
        self.resolve().is_some()
    }
}

/// Read a persisted override, ignoring a missing or unreadable file
fn load_override(path: &std::path::Path) -> Option<Credentials> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "failed to read override file");
            return None;
        }
    };
    let stored: StoredOverride = match serde_yaml::from_str(&content) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "failed to parse override file");
            return None;
        }
    };
    match Credentials::new(&stored.url, &stored.anon_key) {
        Ok(creds) => Some(creds),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "override file holds invalid credentials");
            None
        }
    }
}

#[async_trait]
impl Backend for BackendHandle {
    async fn query(&self, req: SelectRequest) -> Result<QueryResult, BackendError> {
        self.client().select(&req).await
    }

    async fn mutate(&self, req: MutateRequest) -> Result<QueryResult, BackendError> {
        self.client().mutate(&req).await
    }

    fn credentials_changed(&self) {
        let mut cache = self.client_cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }
}

#[async_trait]
impl ObjectStorage for BackendHandle {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        self.client()
            .upload_object(bucket, path, content_type, bytes)
            .await
    }

    async fn remove(&self, bucket: &str, path: &str) -> Result<(), BackendError> {
        self.client().remove_object(bucket, path).await
    }
}

#[async_trait]
impl AuthProvider for BackendHandle {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, BackendError> {
        self.client().sign_in(email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with(url: Option<&str>, key: Option<&str>, dir: &TempDir) -> BackendConfig {
        BackendConfig {
            url: url.map(|s| s.to_string()),
            anon_key: key.map(|s| s.to_string()),
            override_file: dir.path().join("override.yml"),
        }
    }

    #[test]
    fn test_client_memoized_while_credentials_unchanged() {
        let dir = TempDir::new().unwrap();
        let handle = BackendHandle::from_config(&config_with(
            Some("https://abc.supabase.co"),
            Some("anon-key"),
            &dir,
        ));

        let a = handle.client();
        let b = handle.client();

        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_override_changes_the_active_client() {
        let dir = TempDir::new().unwrap();
        let handle = BackendHandle::from_config(&config_with(
            Some("https://abc.supabase.co"),
            Some("anon-key"),
            &dir,
        ));

        let before = handle.client();
        handle
            .set_override("https://xyz.supabase.co", "other-key")
            .unwrap();
        let after = handle.client();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(handle.status().source, CredentialSource::Override);
        assert_eq!(
            handle.status().url.as_deref(),
            Some("https://xyz.supabase.co")
        );
    }

    #[test]
    fn test_clear_override_falls_back_to_config() {
        let dir = TempDir::new().unwrap();
        let handle = BackendHandle::from_config(&config_with(
            Some("https://abc.supabase.co"),
            Some("anon-key"),
            &dir,
        ));

        handle
            .set_override("https://xyz.supabase.co", "other-key")
            .unwrap();
        handle.clear_override().unwrap();

        assert_eq!(handle.status().source, CredentialSource::Config);
        assert_eq!(
            handle.status().url.as_deref(),
            Some("https://abc.supabase.co")
        );
        // Clearing twice is harmless
        handle.clear_override().unwrap();
    }

    #[test]
    fn test_override_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = config_with(Some("https://abc.supabase.co"), Some("anon-key"), &dir);

        let handle = BackendHandle::from_config(&config);
        handle
            .set_override("https://persisted.supabase.co", "persisted-key")
            .unwrap();
        drop(handle);

        let reloaded = BackendHandle::from_config(&config);
        assert_eq!(reloaded.status().source, CredentialSource::Override);
        assert_eq!(
            reloaded.status().url.as_deref(),
            Some("https://persisted.supabase.co")
        );
    }

    #[test]
    fn test_unconfigured_handle_reports_unset() {
        let dir = TempDir::new().unwrap();
        let handle = BackendHandle::from_config(&config_with(None, None, &dir));

        assert!(!handle.is_configured());
        assert_eq!(handle.status().source, CredentialSource::Unset);
        assert!(handle.status().url.is_none());
    }

    #[tokio::test]
    async fn test_placeholder_client_answers_not_configured() {
        let dir = TempDir::new().unwrap();
        let handle = BackendHandle::from_config(&config_with(None, None, &dir));

        let err = handle
            .query(SelectRequest::table("models"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotConfigured);

        let err = handle
            .mutate(MutateRequest::delete("models", 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotConfigured);
    }

    #[test]
    fn test_half_configured_credentials_count_as_unset() {
        let dir = TempDir::new().unwrap();
        let handle =
            BackendHandle::from_config(&config_with(Some("https://abc.supabase.co"), None, &dir));

        assert!(!handle.is_configured());
    }

    #[test]
    fn test_set_override_rejects_invalid_input() {
        let dir = TempDir::new().unwrap();
        let handle = BackendHandle::from_config(&config_with(None, None, &dir));

        assert!(handle.set_override("", "key").is_err());
        assert!(handle.set_override("ftp://nope", "key").is_err());
        assert!(handle.set_override("https://ok.supabase.co", "  ").is_err());
        assert_eq!(handle.status().source, CredentialSource::Unset);
    }

    #[test]
    fn test_corrupt_override_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let config = config_with(Some("https://abc.supabase.co"), Some("anon-key"), &dir);
        std::fs::write(&config.override_file, "not: [valid").unwrap();

        let handle = BackendHandle::from_config(&config);

        assert_eq!(handle.status().source, CredentialSource::Config);
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials::new("https://abc.supabase.co", "super-secret").unwrap();
        let debug = format!("{:?}", creds);

        assert!(debug.contains("abc.supabase.co"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_credentials_trim_trailing_slash() {
        let creds = Credentials::new("https://abc.supabase.co/", "key").unwrap();
        assert_eq!(creds.url, "https://abc.supabase.co");
    }
}
