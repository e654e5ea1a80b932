//! Cache layer
//!
//! Read-heavy public pages (model showcases, the media feed, active
//! banners) are served from a process-local cache so repeated visits
//! do not hit the backend provider. Entries expire after the
//! configured TTL and are invalidated eagerly whenever an admin
//! mutation touches the underlying rows.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Note: due to Rust's object safety rules this trait cannot be used
/// as a trait object (`dyn CacheLayer`); services hold the concrete
/// [`MemoryCache`] behind an `Arc` instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob-style pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Create a cache instance from configuration.
///
/// A disabled cache still satisfies [`CacheLayer`] but stores nothing,
/// so callers never branch on `config.enabled` themselves.
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    if config.enabled {
        Arc::new(MemoryCache::with_capacity_and_ttl(
            config.max_entries,
            Duration::from_secs(config.ttl_seconds),
        ))
    } else {
        Arc::new(MemoryCache::disabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);

        cache.set("public:banners", &vec!["b1".to_string()]).await.unwrap();
        let result: Option<Vec<String>> = cache.get("public:banners").await.unwrap();
        assert_eq!(result, Some(vec!["b1".to_string()]));
    }

    #[tokio::test]
    async fn test_disabled_cache_stores_nothing() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let cache = create_cache(&config);

        cache.set("public:models", &"value".to_string()).await.unwrap();
        let result: Option<String> = cache.get("public:models").await.unwrap();
        assert_eq!(result, None);
    }
}
