//! Banner service
//!
//! Manages the promotional carousel shown on public pages. The banners
//! table is optional backend schema: when it is absent the admin view
//! surfaces a SQL snippet to create it instead of failing, and the
//! public carousel simply renders empty.

use crate::backend::BackendError;
use crate::cache::{CacheLayer, MemoryCache};
use crate::models::{Banner, BannerPatch, BannerType, NewBanner};
use crate::repositories::BannerRepository;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

const CACHE_KEY_PUBLIC_BANNERS: &str = "public:banners";

/// Setup script shown to the admin when the banners table is missing.
/// Displayed for manual execution in the backend's SQL editor, never
/// executed by this application.
pub const BANNERS_BOOTSTRAP_SQL: &str = r#"create table if not exists public.banners (
  id uuid primary key default gen_random_uuid(),
  created_at timestamptz not null default now(),
  titulo text not null,
  tipo text not null check (tipo in ('image','video')),
  url text,
  link text,
  ordem int not null default 1,
  ativo boolean not null default true
);
create index if not exists idx_banners_ordem on public.banners(ordem asc);
alter table public.banners enable row level security;
create policy "Banners are readable" on public.banners for select using (true);
create policy "Authenticated manages banners" on public.banners for all to authenticated using (true);"#;

/// Error types for banner operations
#[derive(Debug, thiserror::Error)]
pub enum BannerServiceError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Banner not found
    #[error("Banner not found: {0}")]
    NotFound(String),

    /// A backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Counts shown as badges on the admin banner page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerStats {
    pub total: usize,
    pub active: usize,
    pub images: usize,
    pub videos: usize,
}

/// Admin view of the banner catalog
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPage {
    pub items: Vec<Banner>,
    pub stats: BannerStats,
    /// Present only when the banners table does not exist yet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_sql: Option<String>,
}

/// Banner service
pub struct BannerService {
    repo: Arc<dyn BannerRepository>,
    cache: Arc<MemoryCache>,
}

impl BannerService {
    /// Create a new banner service
    pub fn new(repo: Arc<dyn BannerRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Full catalog for the admin page, ordered by position.
    ///
    /// A missing table is not an error here: the page gets an empty
    /// catalog plus the SQL needed to create it.
    pub async fn list_admin(&self) -> Result<BannerPage, BannerServiceError> {
        match self.repo.list_ordered().await {
            Ok(items) => {
                let stats = derive_stats(&items);
                Ok(BannerPage {
                    items,
                    stats,
                    bootstrap_sql: None,
                })
            }
            Err(err) if err.is_missing_relation() => {
                warn!("banners table missing, serving setup instructions");
                Ok(BannerPage {
                    items: vec![],
                    stats: derive_stats(&[]),
                    bootstrap_sql: Some(BANNERS_BOOTSTRAP_SQL.to_string()),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Active banners for the public carousel, cached.
    ///
    /// A missing table degrades to an empty carousel. That result is
    /// not cached, so the carousel recovers as soon as the table lands.
    pub async fn list_active(&self) -> Result<Vec<Banner>, BannerServiceError> {
        if let Some(banners) = self
            .cache
            .get::<Vec<Banner>>(CACHE_KEY_PUBLIC_BANNERS)
            .await
            .ok()
            .flatten()
        {
            return Ok(banners);
        }

        match self.repo.list_active().await {
            Ok(banners) => {
                let _ = self.cache.set(CACHE_KEY_PUBLIC_BANNERS, &banners).await;
                Ok(banners)
            }
            Err(err) if err.is_missing_relation() => Ok(vec![]),
            Err(err) => Err(err.into()),
        }
    }

    /// Create a banner
    pub async fn create(&self, mut row: NewBanner) -> Result<Banner, BannerServiceError> {
        row.titulo = row.titulo.trim().to_string();
        if row.titulo.is_empty() {
            return Err(BannerServiceError::Validation(
                "Banner title must not be empty".to_string(),
            ));
        }

        let created = self.repo.create(&row).await?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Apply a partial update to a banner
    pub async fn update(&self, id: &str, patch: &BannerPatch) -> Result<Banner, BannerServiceError> {
        let existing = self.get(id).await?;
        if patch.is_empty() {
            return Ok(existing);
        }

        if let Some(titulo) = &patch.titulo {
            if titulo.trim().is_empty() {
                return Err(BannerServiceError::Validation(
                    "Banner title must not be empty".to_string(),
                ));
            }
        }

        let updated = self.repo.update(id, patch).await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a banner row. Uploaded banner assets stay in storage.
    pub async fn delete(&self, id: &str) -> Result<(), BannerServiceError> {
        self.get(id).await?;
        self.repo.delete(id).await?;
        self.invalidate_cache().await;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Banner, BannerServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| BannerServiceError::NotFound(format!("banner {}", id)))
    }

    async fn invalidate_cache(&self) {
        let _ = self.cache.delete(CACHE_KEY_PUBLIC_BANNERS).await;
    }
}

fn derive_stats(items: &[Banner]) -> BannerStats {
    BannerStats {
        total: items.len(),
        active: items.iter().filter(|b| b.ativo).count(),
        images: items.iter().filter(|b| b.tipo == BannerType::Image).count(),
        videos: items.iter().filter(|b| b.tipo == BannerType::Video).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ErrorKind;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct FakeBannerRepo {
        banners: Mutex<Vec<Banner>>,
        table_exists: bool,
        list_active_calls: AtomicUsize,
        update_calls: AtomicUsize,
    }

    impl FakeBannerRepo {
        fn new(banners: Vec<Banner>) -> Arc<Self> {
            Arc::new(Self {
                banners: Mutex::new(banners),
                table_exists: true,
                list_active_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
            })
        }

        fn without_table() -> Arc<Self> {
            Arc::new(Self {
                banners: Mutex::new(vec![]),
                table_exists: false,
                list_active_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
            })
        }

        fn missing_relation() -> BackendError {
            BackendError::new(
                ErrorKind::RelationMissing,
                "relation \"public.banners\" does not exist",
            )
        }
    }

    #[async_trait]
    impl BannerRepository for FakeBannerRepo {
        async fn list_ordered(&self) -> Result<Vec<Banner>, BackendError> {
            if !self.table_exists {
                return Err(Self::missing_relation());
            }
            let mut banners = self.banners.lock().await.clone();
            banners.sort_by_key(|b| b.ordem);
            Ok(banners)
        }

        async fn list_active(&self) -> Result<Vec<Banner>, BackendError> {
            self.list_active_calls.fetch_add(1, Ordering::SeqCst);
            if !self.table_exists {
                return Err(Self::missing_relation());
            }
            let mut banners: Vec<Banner> = self
                .banners
                .lock()
                .await
                .iter()
                .filter(|b| b.ativo)
                .cloned()
                .collect();
            banners.sort_by_key(|b| b.ordem);
            Ok(banners)
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<Banner>, BackendError> {
            if !self.table_exists {
                return Err(Self::missing_relation());
            }
            Ok(self.banners.lock().await.iter().find(|b| b.id == id).cloned())
        }

        async fn create(&self, row: &NewBanner) -> Result<Banner, BackendError> {
            if !self.table_exists {
                return Err(Self::missing_relation());
            }
            let mut banners = self.banners.lock().await;
            let banner = Banner {
                id: format!("banner-{}", banners.len() + 1),
                created_at: Utc::now(),
                titulo: row.titulo.clone(),
                tipo: row.tipo,
                url: row.url.clone(),
                link: row.link.clone(),
                ordem: row.ordem,
                ativo: row.ativo,
            };
            banners.push(banner.clone());
            Ok(banner)
        }

        async fn update(&self, id: &str, patch: &BannerPatch) -> Result<Banner, BackendError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let mut banners = self.banners.lock().await;
            let banner = banners
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or_else(|| BackendError::not_found("no banner matched"))?;
            if let Some(titulo) = &patch.titulo {
                banner.titulo = titulo.clone();
            }
            if let Some(ativo) = patch.ativo {
                banner.ativo = ativo;
            }
            if let Some(ordem) = patch.ordem {
                banner.ordem = ordem;
            }
            Ok(banner.clone())
        }

        async fn delete(&self, id: &str) -> Result<(), BackendError> {
            self.banners.lock().await.retain(|b| b.id != id);
            Ok(())
        }
    }

    fn banner(id: &str, ordem: i32, tipo: BannerType, ativo: bool) -> Banner {
        Banner {
            id: id.to_string(),
            created_at: Utc::now(),
            titulo: format!("Banner {}", id),
            tipo,
            url: Some(format!("https://x/{}.jpg", id)),
            link: None,
            ordem,
            ativo,
        }
    }

    fn service(repo: Arc<FakeBannerRepo>) -> BannerService {
        BannerService::new(repo, Arc::new(MemoryCache::new()))
    }

    // ========================================================================
    // Admin listing
    // ========================================================================

    #[tokio::test]
    async fn test_list_admin_orders_and_counts() {
        let repo = FakeBannerRepo::new(vec![
            banner("b", 2, BannerType::Video, false),
            banner("a", 1, BannerType::Image, true),
            banner("c", 3, BannerType::Image, true),
        ]);
        let page = service(repo).list_admin().await.unwrap();

        let ids: Vec<&str> = page.items.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(page.stats.total, 3);
        assert_eq!(page.stats.active, 2);
        assert_eq!(page.stats.images, 2);
        assert_eq!(page.stats.videos, 1);
        assert!(page.bootstrap_sql.is_none());
    }

    #[tokio::test]
    async fn test_list_admin_surfaces_setup_sql_when_table_missing() {
        let page = service(FakeBannerRepo::without_table())
            .list_admin()
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.stats.total, 0);
        let sql = page.bootstrap_sql.unwrap();
        assert!(sql.contains("create table if not exists public.banners"));
        assert!(sql.contains("tipo in ('image','video')"));
    }

    // ========================================================================
    // Public listing
    // ========================================================================

    #[tokio::test]
    async fn test_list_active_filters_and_caches() {
        let repo = FakeBannerRepo::new(vec![
            banner("a", 1, BannerType::Image, true),
            banner("b", 2, BannerType::Image, false),
        ]);
        let service = service(repo.clone());

        let first = service.list_active().await.unwrap();
        let second = service.list_active().await.unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(repo.list_active_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_list_active_degrades_to_empty_without_caching() {
        let repo = FakeBannerRepo::without_table();
        let service = service(repo.clone());

        assert!(service.list_active().await.unwrap().is_empty());
        assert!(service.list_active().await.unwrap().is_empty());

        // Degraded result is refetched every time so recovery is instant
        assert_eq!(repo.list_active_calls.load(Ordering::SeqCst), 2);
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let result = service(FakeBannerRepo::new(vec![]))
            .create(NewBanner {
                titulo: "   ".to_string(),
                tipo: BannerType::Image,
                url: None,
                link: None,
                ordem: 1,
                ativo: true,
            })
            .await;

        assert!(matches!(result, Err(BannerServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_trims_title_and_invalidates_cache() {
        let repo = FakeBannerRepo::new(vec![banner("a", 1, BannerType::Image, true)]);
        let service = service(repo.clone());

        // Prime the public cache
        assert_eq!(service.list_active().await.unwrap().len(), 1);

        let created = service
            .create(NewBanner {
                titulo: "  Summer drop  ".to_string(),
                tipo: BannerType::Video,
                url: Some("https://x/drop.mp4".to_string()),
                link: None,
                ordem: 2,
                ativo: true,
            })
            .await
            .unwrap();

        assert_eq!(created.titulo, "Summer drop");
        assert_eq!(service.list_active().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_patches_fields() {
        let repo = FakeBannerRepo::new(vec![banner("a", 1, BannerType::Image, true)]);
        let service = service(repo);

        let updated = service
            .update(
                "a",
                &BannerPatch {
                    ativo: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.ativo);
    }

    #[tokio::test]
    async fn test_update_unknown_banner() {
        let result = service(FakeBannerRepo::new(vec![]))
            .update("ghost", &BannerPatch::default())
            .await;

        assert!(matches!(result, Err(BannerServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_patch_skips_backend_write() {
        let repo = FakeBannerRepo::new(vec![banner("a", 1, BannerType::Image, true)]);
        let service = service(repo.clone());

        let unchanged = service.update("a", &BannerPatch::default()).await.unwrap();

        assert_eq!(unchanged.id, "a");
        assert_eq!(repo.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_banner() {
        let repo = FakeBannerRepo::new(vec![banner("a", 1, BannerType::Image, true)]);
        let service = service(repo.clone());

        service.delete("a").await.unwrap();

        assert!(repo.banners.lock().await.is_empty());
        assert!(matches!(
            service.delete("a").await,
            Err(BannerServiceError::NotFound(_))
        ));
    }
}
