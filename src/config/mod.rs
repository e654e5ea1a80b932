//! Configuration management
//!
//! This module handles loading and parsing configuration for the Cove showcase system.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. Backend credentials
//! may be left unset entirely, in which case the system starts in placeholder mode
//! and serves empty data until credentials are supplied at runtime.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Hosted backend configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Admin session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::default(),
            session: SessionConfig::default(),
            cache: CacheConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Hosted backend configuration
///
/// The project URL and anon key identify the backend instance that stores
/// all profiles, media rows and uploaded files. Both are optional: when
/// either is missing the system degrades to a placeholder client that
/// answers every request with a "not configured" error instead of failing
/// at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend project URL, e.g. "https://abc123.supabase.co"
    #[serde(default)]
    pub url: Option<String>,
    /// Public anon key used for REST, storage and auth calls
    #[serde(default)]
    pub anon_key: Option<String>,
    /// File where runtime credential overrides are persisted
    #[serde(default = "default_override_file")]
    pub override_file: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            override_file: default_override_file(),
        }
    }
}

fn default_override_file() -> PathBuf {
    PathBuf::from("data/backend_override.yml")
}

/// Admin session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle minutes before a session expires
    #[serde(default = "default_idle_minutes")]
    pub idle_minutes: i64,
    /// Interval between expired-session sweeps, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_minutes: default_idle_minutes(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_idle_minutes() -> i64 {
    30
}

fn default_sweep_interval() -> u64 {
    300
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the public response cache is enabled
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Maximum number of cached entries
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_ttl() -> u64 {
    60
}

fn default_max_entries() -> u64 {
    1000
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum file size in bytes (default: 50MB, videos included)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed MIME types for uploaded media
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
    /// Storage buckets uploads may target
    #[serde(default = "default_buckets")]
    pub buckets: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
            buckets: default_buckets(),
        }
    }
}

fn default_max_file_size() -> u64 {
    50 * 1024 * 1024 // 50MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
        "video/mp4".to_string(),
        "video/webm".to_string(),
    ]
}

fn default_buckets() -> Vec<String> {
    vec![
        "media".to_string(),
        "models".to_string(),
        "banners".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Check if a storage bucket may be targeted by uploads
    pub fn is_bucket_allowed(&self, bucket: &str) -> bool {
        self.buckets.iter().any(|b| b == bucket)
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        // If file doesn't exist, return defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        // Read the file content
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // Handle empty file - return defaults
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        // Parse YAML with detailed error messages
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - COVE_SERVER_HOST
    /// - COVE_SERVER_PORT
    /// - COVE_SERVER_CORS_ORIGIN
    /// - COVE_BACKEND_URL
    /// - COVE_BACKEND_ANON_KEY
    /// - COVE_BACKEND_OVERRIDE_FILE
    /// - COVE_SESSION_IDLE_MINUTES
    /// - COVE_SESSION_SWEEP_INTERVAL_SECONDS
    /// - COVE_CACHE_ENABLED
    /// - COVE_CACHE_TTL_SECONDS
    /// - COVE_UPLOAD_MAX_FILE_SIZE
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        // First load from file (or defaults)
        let mut config = Self::load(path)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("COVE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("COVE_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("COVE_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        // Backend configuration
        if let Ok(url) = std::env::var("COVE_BACKEND_URL") {
            if !url.trim().is_empty() {
                self.backend.url = Some(url);
            }
        }
        if let Ok(key) = std::env::var("COVE_BACKEND_ANON_KEY") {
            if !key.trim().is_empty() {
                self.backend.anon_key = Some(key);
            }
        }
        if let Ok(path) = std::env::var("COVE_BACKEND_OVERRIDE_FILE") {
            self.backend.override_file = PathBuf::from(path);
        }

        // Session configuration
        if let Ok(minutes) = std::env::var("COVE_SESSION_IDLE_MINUTES") {
            if let Ok(minutes) = minutes.parse::<i64>() {
                self.session.idle_minutes = minutes;
            }
        }
        if let Ok(interval) = std::env::var("COVE_SESSION_SWEEP_INTERVAL_SECONDS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.session.sweep_interval_seconds = interval;
            }
        }

        // Cache configuration
        if let Ok(enabled) = std::env::var("COVE_CACHE_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.cache.enabled = true,
                "false" | "0" | "no" => self.cache.enabled = false,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(ttl) = std::env::var("COVE_CACHE_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.cache.ttl_seconds = ttl;
            }
        }

        // Upload configuration
        if let Ok(size) = std::env::var("COVE_UPLOAD_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }
    }

    /// Validate configuration values
    ///
    /// Credentials are intentionally not required here; a half-configured
    /// backend (only one of url/key) is treated as unset at runtime.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.backend.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "backend.url must start with http:// or https://, got '{}'",
                    url
                )));
            }
        }
        if self.session.idle_minutes < 1 {
            return Err(ConfigError::ValidationError(
                "session.idle_minutes must be at least 1".to_string(),
            ));
        }
        if self.session.sweep_interval_seconds < 1 {
            return Err(ConfigError::ValidationError(
                "session.sweep_interval_seconds must be at least 1".to_string(),
            ));
        }
        if self.upload.max_file_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_file_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
// Both `tests` and `property_tests` modules use this to prevent race conditions.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const COVE_ENV_VARS: &[&str] = &[
    "COVE_SERVER_HOST",
    "COVE_SERVER_PORT",
    "COVE_SERVER_CORS_ORIGIN",
    "COVE_BACKEND_URL",
    "COVE_BACKEND_ANON_KEY",
    "COVE_BACKEND_OVERRIDE_FILE",
    "COVE_SESSION_IDLE_MINUTES",
    "COVE_SESSION_SWEEP_INTERVAL_SECONDS",
    "COVE_CACHE_ENABLED",
    "COVE_CACHE_TTL_SECONDS",
    "COVE_UPLOAD_MAX_FILE_SIZE",
];
