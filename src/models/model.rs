//! Model profile entity
//!
//! This module defines the profile entity for the people showcased on the site,
//! plus the insert/patch payloads sent to the backend. Field names match the
//! `models` table columns in the hosted backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum trimmed bio length before a profile counts as "complete"
/// for catalog quality statistics.
pub const FULL_BIO_MIN_CHARS: usize = 20;

/// A showcased profile.
///
/// `slug` is optional on old rows; profiles without one are unreachable
/// through the public site until an admin saves them again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub nome: String,
    /// Profile biography
    pub bio: String,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Cover/banner image URL
    #[serde(default)]
    pub banner_url: Option<String>,
    /// Social links, free-form text
    #[serde(default)]
    pub redes: Option<String>,
    /// URL-friendly slug
    #[serde(default)]
    pub slug: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Whether the profile has an avatar set
    pub fn has_avatar(&self) -> bool {
        self.avatar_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    /// Whether the profile carries a substantial bio
    pub fn has_full_bio(&self) -> bool {
        self.bio.trim().chars().count() >= FULL_BIO_MIN_CHARS
    }
}

/// Insert payload for a new profile
#[derive(Debug, Clone, Serialize)]
pub struct NewModel {
    pub nome: String,
    pub bio: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redes: Option<String>,
}

/// Partial update payload for a profile
///
/// Only fields set to `Some` are sent to the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redes: Option<String>,
}

impl ModelPatch {
    /// Whether the patch carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.nome.is_none()
            && self.bio.is_none()
            && self.slug.is_none()
            && self.avatar_url.is_none()
            && self.banner_url.is_none()
            && self.redes.is_none()
    }
}
