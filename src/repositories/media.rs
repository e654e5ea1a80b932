//! Media repository
//!
//! Reads and writes against the `media` table, including the relationship
//! selects that embed the owning profile name.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::backend::{Backend, BackendError, MutateRequest, SelectRequest};
use crate::models::{Media, MediaType, NewMedia};

/// Default cap applied to admin media searches
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

/// Columns for selects that embed the owning profile name
const WITH_OWNER: &str = "*,models(nome)";

/// Admin search filter
#[derive(Debug, Clone)]
pub struct MediaFilter {
    /// Case-insensitive caption match
    pub text: Option<String>,
    /// Restrict to photos or videos
    pub tipo: Option<MediaType>,
    /// Restrict to one profile
    pub model_id: Option<i64>,
    /// Result cap
    pub limit: usize,
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self {
            text: None,
            tipo: None,
            model_id: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Media repository trait
#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// Most recently created items with owner names, plus the exact total count
    async fn recent_with_owner(&self, limit: usize) -> Result<(Vec<Media>, i64), BackendError>;

    /// Creation timestamps of items created at or after `since`
    async fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, BackendError>;

    /// Items scheduled to publish at or after `now`, soonest first
    async fn scheduled_after(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Media>, BackendError>;

    /// Admin search with caption/type/profile filters, newest first
    async fn search(&self, filter: &MediaFilter) -> Result<Vec<Media>, BackendError>;

    /// All items of one profile, newest first
    async fn list_for_model(&self, model_id: i64) -> Result<Vec<Media>, BackendError>;

    /// Newest items across all profiles, for the public feed
    async fn list_recent(&self, limit: usize) -> Result<Vec<Media>, BackendError>;

    /// Get an item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Media>, BackendError>;

    /// Insert a media row exactly as given
    async fn insert(&self, row: &NewMedia) -> Result<Media, BackendError>;

    /// Delete a media row
    async fn delete(&self, id: i64) -> Result<(), BackendError>;
}

/// REST-backed media repository
pub struct RestMediaRepository {
    backend: Arc<dyn Backend>,
}

impl RestMediaRepository {
    /// Create a new REST media repository
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(backend: Arc<dyn Backend>) -> Arc<dyn MediaRepository> {
        Arc::new(Self::new(backend))
    }
}

#[derive(Debug, Deserialize)]
struct CreatedAtRow {
    created_at: DateTime<Utc>,
}

#[async_trait]
impl MediaRepository for RestMediaRepository {
    async fn recent_with_owner(&self, limit: usize) -> Result<(Vec<Media>, i64), BackendError> {
        let result = self
            .backend
            .query(
                SelectRequest::table("media")
                    .columns(WITH_OWNER)
                    .order_desc("created_at")
                    .limit(limit)
                    .with_exact_count(),
            )
            .await?;
        let total = result.total.unwrap_or(0);
        let rows: Vec<Media> = result.decode()?;
        Ok((rows, total))
    }

    async fn created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, BackendError> {
        let rows: Vec<CreatedAtRow> = self
            .backend
            .query(
                SelectRequest::table("media")
                    .columns("created_at")
                    .gte("created_at", since.to_rfc3339()),
            )
            .await?
            .decode()?;
        Ok(rows.into_iter().map(|r| r.created_at).collect())
    }

    async fn scheduled_after(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Media>, BackendError> {
        self.backend
            .query(
                SelectRequest::table("media")
                    .columns(WITH_OWNER)
                    .gte("publicar_em", now.to_rfc3339())
                    .order_asc("publicar_em")
                    .limit(limit),
            )
            .await?
            .decode()
    }

    async fn search(&self, filter: &MediaFilter) -> Result<Vec<Media>, BackendError> {
        let mut req = SelectRequest::table("media")
            .columns(WITH_OWNER)
            .order_desc("created_at")
            .limit(filter.limit);

        if let Some(text) = filter.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            req = req.ilike("descricao", format!("*{}*", text));
        }
        if let Some(tipo) = filter.tipo {
            req = req.eq("tipo", tipo.as_str());
        }
        if let Some(model_id) = filter.model_id {
            req = req.eq("modelo_id", model_id.to_string());
        }

        self.backend.query(req).await?.decode()
    }

    async fn list_for_model(&self, model_id: i64) -> Result<Vec<Media>, BackendError> {
        self.backend
            .query(
                SelectRequest::table("media")
                    .eq("modelo_id", model_id.to_string())
                    .order_desc("created_at"),
            )
            .await?
            .decode()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Media>, BackendError> {
        self.backend
            .query(
                SelectRequest::table("media")
                    .columns(WITH_OWNER)
                    .order_desc("created_at")
                    .limit(limit),
            )
            .await?
            .decode()
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Media>, BackendError> {
        let result = self
            .backend
            .query(SelectRequest::table("media").eq("id", id.to_string()).single())
            .await;
        match result {
            Ok(result) => Ok(Some(result.decode()?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn insert(&self, row: &NewMedia) -> Result<Media, BackendError> {
        let result = self
            .backend
            .mutate(MutateRequest::insert("media", super::to_row(row)?))
            .await?;
        let mut rows: Vec<Media> = result.decode()?;
        rows.pop()
            .ok_or_else(|| BackendError::unknown("insert returned no rows"))
    }

    async fn delete(&self, id: i64) -> Result<(), BackendError> {
        self.backend
            .mutate(MutateRequest::delete("media", id))
            .await?;
        Ok(())
    }
}
