//! Model profile repository
//!
//! Reads and writes against the `models` table.

use async_trait::async_trait;
use std::sync::Arc;

use crate::backend::{Backend, BackendError, MutateRequest, SelectRequest};
use crate::models::{Model, ModelPatch, NewModel};

/// Model profile repository trait
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// List all profiles, newest first
    async fn list(&self) -> Result<Vec<Model>, BackendError>;

    /// Most recently created profiles plus the exact total count
    async fn recent(&self, limit: usize) -> Result<(Vec<Model>, i64), BackendError>;

    /// Get a profile by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Model>, BackendError>;

    /// Get a profile by public slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>, BackendError>;

    /// Create a new profile
    async fn create(&self, row: &NewModel) -> Result<Model, BackendError>;

    /// Apply a partial update to a profile
    async fn update(&self, id: i64, patch: &ModelPatch) -> Result<Model, BackendError>;

    /// Delete a profile
    async fn delete(&self, id: i64) -> Result<(), BackendError>;
}

/// REST-backed model repository
pub struct RestModelRepository {
    backend: Arc<dyn Backend>,
}

impl RestModelRepository {
    /// Create a new REST model repository
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(backend: Arc<dyn Backend>) -> Arc<dyn ModelRepository> {
        Arc::new(Self::new(backend))
    }
}

#[async_trait]
impl ModelRepository for RestModelRepository {
    async fn list(&self) -> Result<Vec<Model>, BackendError> {
        self.backend
            .query(SelectRequest::table("models").order_desc("created_at"))
            .await?
            .decode()
    }

    async fn recent(&self, limit: usize) -> Result<(Vec<Model>, i64), BackendError> {
        let result = self
            .backend
            .query(
                SelectRequest::table("models")
                    .order_desc("id")
                    .limit(limit)
                    .with_exact_count(),
            )
            .await?;
        let total = result.total.unwrap_or(0);
        let rows: Vec<Model> = result.decode()?;
        Ok((rows, total))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Model>, BackendError> {
        let result = self
            .backend
            .query(SelectRequest::table("models").eq("id", id.to_string()).single())
            .await;
        match result {
            Ok(result) => Ok(Some(result.decode()?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>, BackendError> {
        let result = self
            .backend
            .query(SelectRequest::table("models").eq("slug", slug).single())
            .await;
        match result {
            Ok(result) => Ok(Some(result.decode()?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, row: &NewModel) -> Result<Model, BackendError> {
        let result = self
            .backend
            .mutate(MutateRequest::insert("models", super::to_row(row)?))
            .await?;
        let mut rows: Vec<Model> = result.decode()?;
        rows.pop()
            .ok_or_else(|| BackendError::unknown("insert returned no rows"))
    }

    async fn update(&self, id: i64, patch: &ModelPatch) -> Result<Model, BackendError> {
        let result = self
            .backend
            .mutate(MutateRequest::update("models", id, super::to_row(patch)?))
            .await?;
        let mut rows: Vec<Model> = result.decode()?;
        rows.pop()
            .ok_or_else(|| BackendError::not_found(format!("model {} not found", id)))
    }

    async fn delete(&self, id: i64) -> Result<(), BackendError> {
        self.backend
            .mutate(MutateRequest::delete("models", id))
            .await?;
        Ok(())
    }
}
