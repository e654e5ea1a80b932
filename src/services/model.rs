//! Profile service
//!
//! Implements business logic for the showcased profiles:
//! - Create, read, update, delete profiles
//! - Field validation and slug generation
//! - Admin catalog listing with quality filters and statistics
//! - Cached public reads for the showcase pages

use crate::backend::BackendError;
use crate::cache::{CacheLayer, MemoryCache};
use crate::models::{Model, ModelPatch, NewModel};
use crate::repositories::ModelRepository;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Cache keys for public reads
const CACHE_KEY_PUBLIC_MODELS: &str = "public:models";
const CACHE_KEY_MODEL_BY_SLUG: &str = "public:model:";

/// Minimum trimmed display-name length
const NAME_MIN_CHARS: usize = 3;

/// Minimum trimmed bio length
const BIO_MIN_CHARS: usize = 10;

/// Minimum slug length when one is supplied explicitly
const SLUG_MIN_CHARS: usize = 2;

/// Error types for profile operations
#[derive(Debug, thiserror::Error)]
pub enum ModelServiceError {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    NotFound(String),

    /// A backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Admin catalog filter for profile completeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogFilter {
    #[default]
    All,
    /// Profiles without an avatar image
    MissingAvatar,
    /// Profiles whose bio is too short to count as complete
    MissingBio,
}

impl FromStr for CatalogFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(CatalogFilter::All),
            "missing-avatar" | "missing_avatar" => Ok(CatalogFilter::MissingAvatar),
            "missing-bio" | "missing_bio" => Ok(CatalogFilter::MissingBio),
            other => Err(format!("unknown catalog filter '{}'", other)),
        }
    }
}

/// Completeness statistics over the whole catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    pub with_avatar: usize,
    pub with_full_bio: usize,
}

/// Admin catalog response: the filtered rows plus stats over all rows
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub models: Vec<Model>,
    pub stats: CatalogStats,
}

/// Incoming payload for creating a profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelDraft {
    pub nome: String,
    pub bio: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub redes: Option<String>,
}

/// Profile service
pub struct ModelService {
    repo: Arc<dyn ModelRepository>,
    cache: Arc<MemoryCache>,
}

impl ModelService {
    /// Create a new profile service
    pub fn new(repo: Arc<dyn ModelRepository>, cache: Arc<MemoryCache>) -> Self {
        Self { repo, cache }
    }

    /// Create a profile.
    ///
    /// The slug is generated from the display name unless one is
    /// supplied explicitly.
    ///
    /// # Errors
    /// - `Validation` if the name, bio or slug fail the length/format rules
    pub async fn create(&self, draft: ModelDraft) -> Result<Model, ModelServiceError> {
        let nome = draft.nome.trim().to_string();
        let bio = draft.bio.trim().to_string();

        validate_nome(&nome)?;
        validate_bio(&bio)?;
        let slug = resolve_slug(draft.slug.as_deref(), &nome)?;

        let row = NewModel {
            nome,
            bio,
            slug,
            avatar_url: none_if_blank(draft.avatar_url),
            banner_url: none_if_blank(draft.banner_url),
            redes: none_if_blank(draft.redes),
        };

        let created = self.repo.create(&row).await?;
        self.invalidate_cache().await;
        Ok(created)
    }

    /// Get a profile by ID
    pub async fn get(&self, id: i64) -> Result<Model, ModelServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ModelServiceError::NotFound(format!("profile {}", id)))
    }

    /// Update a profile.
    ///
    /// The patch is validated against the merged result, so a partial
    /// update can never push a stored profile below the field rules.
    /// An empty patch returns the stored profile untouched.
    pub async fn update(&self, id: i64, patch: ModelPatch) -> Result<Model, ModelServiceError> {
        let existing = self.get(id).await?;
        if patch.is_empty() {
            return Ok(existing);
        }

        let mut patch = patch;
        if let Some(ref nome) = patch.nome {
            let nome = nome.trim().to_string();
            validate_nome(&nome)?;
            patch.nome = Some(nome);
        }
        if let Some(ref bio) = patch.bio {
            let bio = bio.trim().to_string();
            validate_bio(&bio)?;
            patch.bio = Some(bio);
        }
        if let Some(ref slug) = patch.slug {
            // A blank slug re-generates from the effective name
            let nome = patch.nome.as_deref().unwrap_or(&existing.nome);
            patch.slug = Some(resolve_slug(Some(slug), nome)?);
        }

        let updated = self.repo.update(id, &patch).await?;
        self.invalidate_cache().await;
        Ok(updated)
    }

    /// Delete a profile
    pub async fn delete(&self, id: i64) -> Result<(), ModelServiceError> {
        // Surface a 404 for unknown IDs instead of a silent no-op
        self.get(id).await?;
        self.repo.delete(id).await?;
        self.invalidate_cache().await;
        Ok(())
    }

    /// Admin catalog listing.
    ///
    /// `query` matches the name or bio case-insensitively; `filter`
    /// narrows to incomplete profiles. Statistics always cover the
    /// whole catalog, not just the filtered rows.
    pub async fn list_catalog(
        &self,
        filter: CatalogFilter,
        query: Option<&str>,
    ) -> Result<CatalogPage, ModelServiceError> {
        let all = self.repo.list().await?;

        let stats = CatalogStats {
            total: all.len(),
            with_avatar: all.iter().filter(|m| m.has_avatar()).count(),
            with_full_bio: all.iter().filter(|m| m.has_full_bio()).count(),
        };

        let needle = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
        let models = all
            .into_iter()
            .filter(|m| match filter {
                CatalogFilter::All => true,
                CatalogFilter::MissingAvatar => !m.has_avatar(),
                CatalogFilter::MissingBio => !m.has_full_bio(),
            })
            .filter(|m| match &needle {
                Some(q) => {
                    m.nome.to_lowercase().contains(q) || m.bio.to_lowercase().contains(q)
                }
                None => true,
            })
            .collect();

        Ok(CatalogPage { models, stats })
    }

    /// All profiles for the public site, cached
    pub async fn list_public(&self) -> Result<Vec<Model>, ModelServiceError> {
        if let Some(models) = self
            .cache
            .get::<Vec<Model>>(CACHE_KEY_PUBLIC_MODELS)
            .await
            .ok()
            .flatten()
        {
            return Ok(models);
        }

        let models = self.repo.list().await?;
        let _ = self.cache.set(CACHE_KEY_PUBLIC_MODELS, &models).await;
        Ok(models)
    }

    /// Look up a profile by its public slug, cached
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Model>, ModelServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_MODEL_BY_SLUG, slug);
        if let Some(model) = self.cache.get::<Model>(&cache_key).await.ok().flatten() {
            return Ok(Some(model));
        }

        let model = self.repo.get_by_slug(slug).await?;
        if let Some(ref found) = model {
            let _ = self.cache.set(&cache_key, found).await;
        }
        Ok(model)
    }

    /// Invalidate every public key a profile mutation can affect.
    /// The media feed embeds profile names, so it goes too.
    async fn invalidate_cache(&self) {
        let _ = self.cache.delete(CACHE_KEY_PUBLIC_MODELS).await;
        let _ = self
            .cache
            .delete_pattern(&format!("{}*", CACHE_KEY_MODEL_BY_SLUG))
            .await;
        let _ = self.cache.delete_pattern("public:media*").await;
    }
}

/// Optional profile fields persist as NULL when left blank.
fn none_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_nome(nome: &str) -> Result<(), ModelServiceError> {
    if nome.chars().count() < NAME_MIN_CHARS {
        return Err(ModelServiceError::Validation(format!(
            "Name must be at least {} characters",
            NAME_MIN_CHARS
        )));
    }
    Ok(())
}

fn validate_bio(bio: &str) -> Result<(), ModelServiceError> {
    if bio.chars().count() < BIO_MIN_CHARS {
        return Err(ModelServiceError::Validation(format!(
            "Bio must be at least {} characters",
            BIO_MIN_CHARS
        )));
    }
    Ok(())
}

/// Pick the profile slug: a supplied non-blank slug must pass the
/// format rules, anything else falls back to generating one from the
/// display name.
fn resolve_slug(supplied: Option<&str>, nome: &str) -> Result<String, ModelServiceError> {
    if let Some(slug) = supplied.map(str::trim).filter(|s| !s.is_empty()) {
        if slug.chars().count() < SLUG_MIN_CHARS {
            return Err(ModelServiceError::Validation(format!(
                "Slug must be at least {} characters",
                SLUG_MIN_CHARS
            )));
        }
        if !is_valid_slug(slug) {
            return Err(ModelServiceError::Validation(
                "Slug may only contain lowercase letters, digits and hyphens".to_string(),
            ));
        }
        return Ok(slug.to_string());
    }

    let generated = generate_slug(nome);
    if generated.is_empty() {
        return Err(ModelServiceError::Validation(
            "Name contains no characters usable in a slug; supply one explicitly".to_string(),
        ));
    }
    Ok(generated)
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Generate a URL-friendly slug from a display name.
///
/// Lowercases, keeps ASCII letters and digits, turns separators into
/// hyphens and drops everything else, then collapses hyphen runs.
pub fn generate_slug(nome: &str) -> String {
    let slug: String = nome
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_ascii_alphanumeric() {
                Some(c)
            } else if c == ' ' || c == '_' || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect();

    // Collapse consecutive hyphens and trim them from both ends
    let mut result = String::new();
    let mut prev_hyphen = false;
    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}
