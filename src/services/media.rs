//! Media service
//!
//! Implements business logic for photo and video items:
//! - Admin search and creation
//! - Deletion with a storage cascade, so removing a row also removes
//!   the uploaded file it points at
//! - Cached public reads for the home feed and the showcase pages

use crate::backend::storage::object_path_from_public_url;
use crate::backend::{BackendError, ObjectStorage};
use crate::cache::{CacheLayer, MemoryCache};
use crate::models::{Media, NewMedia};
use crate::repositories::{MediaFilter, MediaRepository};
use std::sync::Arc;
use tracing::debug;

/// Bucket holding media uploads
const MEDIA_BUCKET: &str = "media";

/// Items on the public home feed
pub const FEED_LIMIT: usize = 12;

/// Cache keys for public reads
const CACHE_KEY_PUBLIC_FEED: &str = "public:media";
const CACHE_KEY_MEDIA_FOR_MODEL: &str = "public:media:model:";

/// Error types for media operations
#[derive(Debug, thiserror::Error)]
pub enum MediaServiceError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Media item not found
    #[error("Media item not found: {0}")]
    NotFound(String),

    /// A backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Media service
pub struct MediaService {
    repo: Arc<dyn MediaRepository>,
    storage: Arc<dyn ObjectStorage>,
    cache: Arc<MemoryCache>,
}

impl MediaService {
    /// Create a new media service
    pub fn new(
        repo: Arc<dyn MediaRepository>,
        storage: Arc<dyn ObjectStorage>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            repo,
            storage,
            cache,
        }
    }

    /// Admin search across the media catalog
    pub async fn search(&self, filter: &MediaFilter) -> Result<Vec<Media>, MediaServiceError> {
        Ok(self.repo.search(filter).await?)
    }

    /// Get one item by ID
    pub async fn get(&self, id: i64) -> Result<Media, MediaServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| MediaServiceError::NotFound(format!("media item {}", id)))
    }

    /// Register a media row pointing at an already uploaded file
    pub async fn create(&self, row: NewMedia) -> Result<Media, MediaServiceError> {
        if row.url.trim().is_empty() {
            return Err(MediaServiceError::Validation(
                "Media URL must not be empty".to_string(),
            ));
        }

        let created = self.repo.insert(&row).await?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Delete an item and the stored file behind it.
    ///
    /// The file goes first: if storage removal fails the row stays, so
    /// a retry can still find the URL. A file that is already gone does
    /// not block the row delete, and URLs pointing outside our bucket
    /// (external imports) have no file to remove at all.
    pub async fn delete(&self, id: i64) -> Result<(), MediaServiceError> {
        let media = self.get(id).await?;

        match object_path_from_public_url(MEDIA_BUCKET, &media.url) {
            Some(path) => match self.storage.remove(MEDIA_BUCKET, &path).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    debug!(media_id = id, path = %path, "stored file already gone");
                }
                Err(err) => return Err(err.into()),
            },
            None => {
                debug!(media_id = id, url = %media.url, "no stored file behind media URL");
            }
        }

        self.repo.delete(id).await?;
        self.invalidate_cache().await;
        Ok(())
    }

    /// Newest items across all profiles for the home feed, cached
    pub async fn home_feed(&self) -> Result<Vec<Media>, MediaServiceError> {
        if let Some(feed) = self
            .cache
            .get::<Vec<Media>>(CACHE_KEY_PUBLIC_FEED)
            .await
            .ok()
            .flatten()
        {
            return Ok(feed);
        }

        let feed = self.repo.list_recent(FEED_LIMIT).await?;
        let _ = self.cache.set(CACHE_KEY_PUBLIC_FEED, &feed).await;
        Ok(feed)
    }

    /// All items of one profile for its showcase page, cached
    pub async fn list_for_model(&self, model_id: i64) -> Result<Vec<Media>, MediaServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_MEDIA_FOR_MODEL, model_id);
        if let Some(items) = self.cache.get::<Vec<Media>>(&cache_key).await.ok().flatten() {
            return Ok(items);
        }

        let items = self.repo.list_for_model(model_id).await?;
        let _ = self.cache.set(&cache_key, &items).await;
        Ok(items)
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete_pattern("public:media*").await;
    }
}
