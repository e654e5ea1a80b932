//! Bulk media import
//!
//! Parses the exporter JSON an admin pastes into the dashboard and turns
//! it into media rows, optionally creating the target profile first.
//! Imported items are scheduled for immediate publication; when the
//! backing table has no scheduling column the affected items are stored
//! unscheduled and reported back, so the admin sees exactly which items
//! lost their schedule instead of a silent downgrade.

use crate::backend::BackendError;
use crate::cache::{CacheLayer, MemoryCache};
use crate::models::{MediaType, NewMedia, NewModel};
use crate::repositories::{MediaRepository, ModelRepository};
use crate::services::model::generate_slug;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Name given to a profile created from an import with no usable hint
const DEFAULT_MODEL_NAME: &str = "Imported model";

/// Exporters label the lead photo with this prefix; the remainder is
/// usually the profile's display name
const COVER_HINT_PREFIX: &str = "Cover image for ";

/// Parsed import document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportPayload {
    pub profile: Option<ImportProfile>,
    pub media_items: Vec<ImportItem>,
}

/// Profile imagery carried alongside the media list
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportProfile {
    pub cover_image: Option<String>,
    pub profile_avatar: Option<String>,
}

/// One media entry in the import document
#[derive(Debug, Clone, Deserialize)]
pub struct ImportItem {
    /// Exporter-side identifier, accepted but not stored
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    #[serde(default)]
    pub hint: Option<String>,
}

/// Where the imported items should land
#[derive(Debug, Clone)]
pub enum ImportTarget {
    /// Attach to a profile that already exists
    Existing(i64),
    /// Create a profile first; `None` falls back to the hint-derived name
    New { name: Option<String> },
}

/// Result summary returned to the admin
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub model_id: i64,
    pub imported: usize,
    /// URLs of items stored without their publish schedule
    pub schedule_dropped: Vec<String>,
}

/// Error types for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The document failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target profile does not exist
    #[error("Model not found: {0}")]
    NotFound(String),

    /// A backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Bulk import service
pub struct ImportService {
    models: Arc<dyn ModelRepository>,
    media: Arc<dyn MediaRepository>,
    cache: Arc<MemoryCache>,
}

impl ImportService {
    /// Create a new import service
    pub fn new(
        models: Arc<dyn ModelRepository>,
        media: Arc<dyn MediaRepository>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            models,
            media,
            cache,
        }
    }

    /// Run an import against the given target.
    ///
    /// Items are inserted one by one; a failure aborts the run but rows
    /// written before it stay, since the backing store offers no
    /// client-side transaction. Nothing is written when validation
    /// rejects the document.
    pub async fn run(
        &self,
        target: ImportTarget,
        payload: ImportPayload,
    ) -> Result<ImportOutcome, ImportError> {
        if payload.media_items.is_empty() {
            return Err(ImportError::Validation(
                "Import JSON must contain at least one entry in mediaItems".to_string(),
            ));
        }

        let model_id = match target {
            ImportTarget::Existing(id) => {
                self.models
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| ImportError::NotFound(format!("model {}", id)))?;
                id
            }
            ImportTarget::New { name } => self.create_target_model(name, &payload).await?,
        };

        let now = Utc::now();
        let mut schedule_supported = true;
        let mut schedule_dropped = Vec::new();
        let mut imported = 0usize;

        for item in &payload.media_items {
            let mut row = NewMedia {
                modelo_id: model_id,
                url: item.url.clone(),
                tipo: item.media_type,
                descricao: clean_hint(item.hint.as_deref()),
                publicar_em: Some(now),
            };
            if !schedule_supported {
                row = row.without_schedule();
            }

            let stored = match self.media.insert(&row).await {
                Ok(media) => media,
                Err(err) if err.is_missing_column() && schedule_supported => {
                    warn!(
                        url = %row.url,
                        "scheduling column missing, storing remaining items unscheduled"
                    );
                    schedule_supported = false;
                    self.media.insert(&row.without_schedule()).await?
                }
                Err(err) => return Err(err.into()),
            };

            if !schedule_supported {
                schedule_dropped.push(stored.url);
            }
            imported += 1;
        }

        // New profile plus fresh media can shift every public page
        let _ = self.cache.delete_pattern("public:*").await;

        Ok(ImportOutcome {
            model_id,
            imported,
            schedule_dropped,
        })
    }

    /// Create the stub profile an import targets when no model exists yet.
    /// The bio starts empty on purpose; the admin fills it in afterwards.
    async fn create_target_model(
        &self,
        name: Option<String>,
        payload: &ImportPayload,
    ) -> Result<i64, ImportError> {
        let nome = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| suggested_model_name(payload));

        let mut slug = generate_slug(&nome);
        if slug.is_empty() {
            slug = generate_slug(DEFAULT_MODEL_NAME);
        }

        let (avatar_url, banner_url) = match &payload.profile {
            Some(profile) => (profile.profile_avatar.clone(), profile.cover_image.clone()),
            None => (None, None),
        };

        let created = self
            .models
            .create(&NewModel {
                nome,
                bio: String::new(),
                slug,
                avatar_url,
                banner_url,
                redes: None,
            })
            .await?;
        Ok(created.id)
    }
}

/// Derive a display name from the import document's hints.
///
/// Exporters tag the lead item "Cover image for <name>"; the first
/// usable hint wins, with the prefix stripped case-insensitively.
pub fn suggested_model_name(payload: &ImportPayload) -> String {
    payload
        .media_items
        .iter()
        .filter_map(|item| item.hint.as_deref())
        .map(strip_cover_prefix)
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string())
}

fn strip_cover_prefix(hint: &str) -> String {
    let trimmed = hint.trim();
    // The prefix is pure ASCII, so a non-boundary here means a multibyte
    // hint that cannot start with it.
    let split = COVER_HINT_PREFIX.len();
    if trimmed.is_char_boundary(split)
        && trimmed[..split].eq_ignore_ascii_case(COVER_HINT_PREFIX)
    {
        trimmed[split..].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn clean_hint(hint: Option<&str>) -> Option<String> {
    hint.map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Media, Model, ModelPatch};
    use crate::repositories::MediaFilter;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct FakeModelRepo {
        models: Mutex<Vec<Model>>,
        next_id: AtomicI64,
    }

    impl FakeModelRepo {
        fn new(models: Vec<Model>) -> Arc<Self> {
            let next = models.iter().map(|m| m.id).max().unwrap_or(0) + 1;
            Arc::new(Self {
                models: Mutex::new(models),
                next_id: AtomicI64::new(next),
            })
        }
    }

    #[async_trait]
    impl ModelRepository for FakeModelRepo {
        async fn list(&self) -> Result<Vec<Model>, BackendError> {
            Ok(self.models.lock().await.clone())
        }

        async fn recent(&self, limit: usize) -> Result<(Vec<Model>, i64), BackendError> {
            let models = self.models.lock().await;
            Ok((models.iter().take(limit).cloned().collect(), models.len() as i64))
        }

        async fn get_by_id(&self, id: i64) -> Result<Option<Model>, BackendError> {
            Ok(self.models.lock().await.iter().find(|m| m.id == id).cloned())
        }

        async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>, BackendError> {
            Ok(self
                .models
                .lock()
                .await
                .iter()
                .find(|m| m.slug.as_deref() == Some(slug))
                .cloned())
        }

        async fn create(&self, row: &NewModel) -> Result<Model, BackendError> {
            let model = Model {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                nome: row.nome.clone(),
                bio: row.bio.clone(),
                avatar_url: row.avatar_url.clone(),
                banner_url: row.banner_url.clone(),
                redes: row.redes.clone(),
                slug: Some(row.slug.clone()),
                created_at: Some(Utc::now()),
            };
            self.models.lock().await.push(model.clone());
            Ok(model)
        }

        async fn update(&self, _id: i64, _patch: &ModelPatch) -> Result<Model, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn delete(&self, _id: i64) -> Result<(), BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }
    }

    /// Media store that can simulate a table without the scheduling column
    struct FakeMediaRepo {
        items: Mutex<Vec<Media>>,
        next_id: AtomicI64,
        insert_calls: AtomicUsize,
        schedule_column_exists: bool,
    }

    impl FakeMediaRepo {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                items: Mutex::new(vec![]),
                next_id: AtomicI64::new(1),
                insert_calls: AtomicUsize::new(0),
                schedule_column_exists: true,
            })
        }

        fn without_schedule_column() -> Arc<Self> {
            Arc::new(Self {
                items: Mutex::new(vec![]),
                next_id: AtomicI64::new(1),
                insert_calls: AtomicUsize::new(0),
                schedule_column_exists: false,
            })
        }
    }

    #[async_trait]
    impl MediaRepository for FakeMediaRepo {
        async fn recent_with_owner(&self, _limit: usize) -> Result<(Vec<Media>, i64), BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn created_since(
            &self,
            _since: DateTime<Utc>,
        ) -> Result<Vec<DateTime<Utc>>, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn scheduled_after(
            &self,
            _now: DateTime<Utc>,
            _limit: usize,
        ) -> Result<Vec<Media>, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn search(&self, _filter: &MediaFilter) -> Result<Vec<Media>, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn list_for_model(&self, _model_id: i64) -> Result<Vec<Media>, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn list_recent(&self, _limit: usize) -> Result<Vec<Media>, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn get_by_id(&self, _id: i64) -> Result<Option<Media>, BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }

        async fn insert(&self, row: &NewMedia) -> Result<Media, BackendError> {
            self.insert_calls.fetch_add(1, Ordering::SeqCst);
            if row.publicar_em.is_some() && !self.schedule_column_exists {
                return Err(BackendError::new(
                    crate::backend::ErrorKind::ColumnMissing,
                    "column \"publicar_em\" of relation \"media\" does not exist",
                ));
            }
            let media = Media {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                created_at: Utc::now(),
                modelo_id: row.modelo_id,
                url: row.url.clone(),
                tipo: row.tipo,
                descricao: row.descricao.clone(),
                publicar_em: row.publicar_em,
                models: None,
            };
            self.items.lock().await.push(media.clone());
            Ok(media)
        }

        async fn delete(&self, _id: i64) -> Result<(), BackendError> {
            Err(BackendError::unknown("unused in this test"))
        }
    }

    fn existing_model(id: i64, nome: &str) -> Model {
        Model {
            id,
            nome: nome.to_string(),
            bio: "A bio of reasonable length".to_string(),
            avatar_url: None,
            banner_url: None,
            redes: None,
            slug: Some(generate_slug(nome)),
            created_at: Some(Utc::now()),
        }
    }

    fn item(url: &str, hint: Option<&str>) -> ImportItem {
        ImportItem {
            id: None,
            url: url.to_string(),
            media_type: MediaType::Photo,
            hint: hint.map(String::from),
        }
    }

    fn payload(items: Vec<ImportItem>) -> ImportPayload {
        ImportPayload {
            profile: None,
            media_items: items,
        }
    }

    fn service(
        models: Arc<FakeModelRepo>,
        media: Arc<FakeMediaRepo>,
    ) -> ImportService {
        ImportService::new(models, media, Arc::new(MemoryCache::new()))
    }

    // ========================================================================
    // Payload parsing and validation
    // ========================================================================

    #[test]
    fn test_payload_without_media_items_parses_as_empty() {
        let parsed: ImportPayload = serde_json::from_str("{}").unwrap();
        assert!(parsed.media_items.is_empty());
        assert!(parsed.profile.is_none());
    }

    #[test]
    fn test_payload_parses_exporter_fields() {
        let parsed: ImportPayload = serde_json::from_str(
            r#"{
                "profile": {"coverImage": "https://x/cover.jpg", "profileAvatar": "https://x/avatar.jpg"},
                "mediaItems": [
                    {"id": 12, "url": "https://x/a.jpg", "type": "photo", "hint": "Cover image for Ana"},
                    {"url": "https://x/b.mp4", "type": "video"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(parsed.media_items.len(), 2);
        assert_eq!(parsed.media_items[0].media_type, MediaType::Photo);
        assert_eq!(parsed.media_items[1].media_type, MediaType::Video);
        assert_eq!(
            parsed.profile.as_ref().unwrap().cover_image.as_deref(),
            Some("https://x/cover.jpg")
        );
    }

    #[tokio::test]
    async fn test_empty_media_items_rejected_without_writes() {
        let models = FakeModelRepo::new(vec![]);
        let media = FakeMediaRepo::new();
        let service = service(models.clone(), media.clone());

        let result = service
            .run(ImportTarget::New { name: None }, payload(vec![]))
            .await;

        assert!(matches!(result, Err(ImportError::Validation(_))));
        assert!(models.models.lock().await.is_empty());
        assert!(media.items.lock().await.is_empty());
    }

    // ========================================================================
    // Target resolution
    // ========================================================================

    #[tokio::test]
    async fn test_import_into_existing_model() {
        let models = FakeModelRepo::new(vec![existing_model(7, "Ana Luiza")]);
        let media = FakeMediaRepo::new();
        let service = service(models, media.clone());

        let outcome = service
            .run(
                ImportTarget::Existing(7),
                payload(vec![
                    item("https://x/a.jpg", Some("Cover image for Ana Luiza")),
                    item("https://x/b.jpg", None),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(outcome.model_id, 7);
        assert_eq!(outcome.imported, 2);
        assert!(outcome.schedule_dropped.is_empty());

        let items = media.items.lock().await;
        assert!(items.iter().all(|m| m.modelo_id == 7));
        assert!(items.iter().all(|m| m.publicar_em.is_some()));
    }

    #[tokio::test]
    async fn test_import_into_unknown_model_fails() {
        let service = service(FakeModelRepo::new(vec![]), FakeMediaRepo::new());

        let result = service
            .run(
                ImportTarget::Existing(42),
                payload(vec![item("https://x/a.jpg", None)]),
            )
            .await;

        assert!(matches!(result, Err(ImportError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_new_target_creates_profile_from_hint() {
        let models = FakeModelRepo::new(vec![]);
        let media = FakeMediaRepo::new();
        let service = service(models.clone(), media.clone());

        let mut doc = payload(vec![item(
            "https://x/a.jpg",
            Some("Cover image for Luna Maria"),
        )]);
        doc.profile = Some(ImportProfile {
            cover_image: Some("https://x/cover.jpg".to_string()),
            profile_avatar: Some("https://x/avatar.jpg".to_string()),
        });

        let outcome = service
            .run(ImportTarget::New { name: None }, doc)
            .await
            .unwrap();

        let created = &models.models.lock().await[0];
        assert_eq!(created.nome, "Luna Maria");
        assert_eq!(created.slug.as_deref(), Some("luna-maria"));
        assert_eq!(created.avatar_url.as_deref(), Some("https://x/avatar.jpg"));
        assert_eq!(created.banner_url.as_deref(), Some("https://x/cover.jpg"));
        assert!(created.bio.is_empty());
        assert_eq!(media.items.lock().await[0].modelo_id, outcome.model_id);
    }

    #[tokio::test]
    async fn test_explicit_name_beats_hint() {
        let models = FakeModelRepo::new(vec![]);
        let service = service(models.clone(), FakeMediaRepo::new());

        service
            .run(
                ImportTarget::New {
                    name: Some("  Bianca  ".to_string()),
                },
                payload(vec![item("https://x/a.jpg", Some("Cover image for Ana"))]),
            )
            .await
            .unwrap();

        assert_eq!(models.models.lock().await[0].nome, "Bianca");
    }

    // ========================================================================
    // Suggested name
    // ========================================================================

    #[test]
    fn test_suggested_name_strips_prefix_case_insensitively() {
        let doc = payload(vec![item("u", Some("cover IMAGE for Luna"))]);
        assert_eq!(suggested_model_name(&doc), "Luna");
    }

    #[test]
    fn test_suggested_name_uses_first_usable_hint() {
        let doc = payload(vec![
            item("a", None),
            item("b", Some("   ")),
            item("c", Some("Backstage shot")),
        ]);
        assert_eq!(suggested_model_name(&doc), "Backstage shot");
    }

    #[test]
    fn test_suggested_name_falls_back_when_no_hints() {
        let doc = payload(vec![item("a", None)]);
        assert_eq!(suggested_model_name(&doc), "Imported model");
    }

    #[test]
    fn test_suggested_name_keeps_multibyte_hint_intact() {
        // 15 ASCII bytes followed by a two-byte character, so the byte
        // at the prefix length falls inside it; must not panic.
        let hint = "Capa de ensaio á";
        assert_eq!(hint.as_bytes().len(), 17);
        assert!(!hint.is_char_boundary(COVER_HINT_PREFIX.len()));

        let doc = payload(vec![item("u", Some(hint))]);
        assert_eq!(suggested_model_name(&doc), hint);
    }

    // ========================================================================
    // Scheduling column fallback
    // ========================================================================

    #[tokio::test]
    async fn test_missing_schedule_column_retries_and_reports() {
        let models = FakeModelRepo::new(vec![existing_model(7, "Ana")]);
        let media = FakeMediaRepo::without_schedule_column();
        let service = service(models, media.clone());

        let outcome = service
            .run(
                ImportTarget::Existing(7),
                payload(vec![
                    item("https://x/a.jpg", None),
                    item("https://x/b.jpg", None),
                    item("https://x/c.jpg", None),
                ]),
            )
            .await
            .unwrap();

        // Stored count equals input count despite the failed first attempt
        assert_eq!(outcome.imported, 3);
        assert_eq!(media.items.lock().await.len(), 3);

        // Every item lost its schedule and says so
        assert_eq!(
            outcome.schedule_dropped,
            vec!["https://x/a.jpg", "https://x/b.jpg", "https://x/c.jpg"]
        );
        assert!(media
            .items
            .lock()
            .await
            .iter()
            .all(|m| m.publicar_em.is_none()));

        // One failed attempt, one retry, then straight to unscheduled inserts
        assert_eq!(media.insert_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_schedule_kept_when_column_exists() {
        let models = FakeModelRepo::new(vec![existing_model(7, "Ana")]);
        let media = FakeMediaRepo::new();
        let service = service(models, media.clone());

        let outcome = service
            .run(
                ImportTarget::Existing(7),
                payload(vec![item("https://x/a.jpg", None)]),
            )
            .await
            .unwrap();

        assert!(outcome.schedule_dropped.is_empty());
        assert_eq!(media.insert_calls.load(Ordering::SeqCst), 1);
        assert!(media.items.lock().await[0].publicar_em.is_some());
    }

    // ========================================================================
    // Field mapping
    // ========================================================================

    #[tokio::test]
    async fn test_hint_becomes_description() {
        let models = FakeModelRepo::new(vec![existing_model(7, "Ana")]);
        let media = FakeMediaRepo::new();
        let service = service(models, media.clone());

        service
            .run(
                ImportTarget::Existing(7),
                payload(vec![
                    item("https://x/a.jpg", Some("  Golden hour  ")),
                    item("https://x/b.jpg", Some("   ")),
                ]),
            )
            .await
            .unwrap();

        let items = media.items.lock().await;
        assert_eq!(items[0].descricao.as_deref(), Some("Golden hour"));
        assert_eq!(items[1].descricao, None);
    }
}
