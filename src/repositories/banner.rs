//! Banner repository
//!
//! Reads and writes against the `banners` table. The table is provisioned
//! manually, so a missing relation is an expected condition callers handle
//! rather than a hard failure.

use async_trait::async_trait;
use std::sync::Arc;

use crate::backend::{Backend, BackendError, MutateRequest, SelectRequest};
use crate::models::{Banner, BannerPatch, NewBanner};

/// Banner repository trait
#[async_trait]
pub trait BannerRepository: Send + Sync {
    /// All banners in display order
    async fn list_ordered(&self) -> Result<Vec<Banner>, BackendError>;

    /// Active banners in display order
    async fn list_active(&self) -> Result<Vec<Banner>, BackendError>;

    /// Get a banner by ID
    async fn get_by_id(&self, id: &str) -> Result<Option<Banner>, BackendError>;

    /// Create a new banner
    async fn create(&self, row: &NewBanner) -> Result<Banner, BackendError>;

    /// Apply a partial update to a banner
    async fn update(&self, id: &str, patch: &BannerPatch) -> Result<Banner, BackendError>;

    /// Delete a banner
    async fn delete(&self, id: &str) -> Result<(), BackendError>;
}

/// REST-backed banner repository
pub struct RestBannerRepository {
    backend: Arc<dyn Backend>,
}

impl RestBannerRepository {
    /// Create a new REST banner repository
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(backend: Arc<dyn Backend>) -> Arc<dyn BannerRepository> {
        Arc::new(Self::new(backend))
    }
}

#[async_trait]
impl BannerRepository for RestBannerRepository {
    async fn list_ordered(&self) -> Result<Vec<Banner>, BackendError> {
        self.backend
            .query(SelectRequest::table("banners").order_asc("ordem"))
            .await?
            .decode()
    }

    async fn list_active(&self) -> Result<Vec<Banner>, BackendError> {
        self.backend
            .query(
                SelectRequest::table("banners")
                    .eq("ativo", "true")
                    .order_asc("ordem"),
            )
            .await?
            .decode()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Banner>, BackendError> {
        let result = self
            .backend
            .query(SelectRequest::table("banners").eq("id", id).single())
            .await;
        match result {
            Ok(result) => Ok(Some(result.decode()?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, row: &NewBanner) -> Result<Banner, BackendError> {
        let result = self
            .backend
            .mutate(MutateRequest::insert("banners", super::to_row(row)?))
            .await?;
        let mut rows: Vec<Banner> = result.decode()?;
        rows.pop()
            .ok_or_else(|| BackendError::unknown("insert returned no rows"))
    }

    async fn update(&self, id: &str, patch: &BannerPatch) -> Result<Banner, BackendError> {
        let result = self
            .backend
            .mutate(MutateRequest::update("banners", id, super::to_row(patch)?))
            .await?;
        let mut rows: Vec<Banner> = result.decode()?;
        rows.pop()
            .ok_or_else(|| BackendError::not_found(format!("banner {} not found", id)))
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.backend
            .mutate(MutateRequest::delete("banners", id))
            .await?;
        Ok(())
    }
}
