//! Media entity
//!
//! Photo and video items attached to a profile. Field names match the `media`
//! table columns in the hosted backend; `models` carries the embedded parent
//! row returned by relationship selects like `*,models(nome)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of a media item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
}

impl MediaType {
    /// Wire representation used in backend rows and query filters
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaType::Photo),
            "video" => Ok(MediaType::Video),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

/// Embedded parent profile returned by relationship selects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaOwner {
    pub nome: String,
}

/// A photo or video attached to a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    /// Unique identifier
    pub id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Owning profile ID
    pub modelo_id: i64,
    /// Public URL of the stored file
    pub url: String,
    /// Photo or video
    pub tipo: MediaType,
    /// Optional caption
    #[serde(default)]
    pub descricao: Option<String>,
    /// Optional publish-at timestamp for scheduled content
    #[serde(default)]
    pub publicar_em: Option<DateTime<Utc>>,
    /// Embedded owner profile, present on relationship selects only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<MediaOwner>,
}

/// Insert payload for a media row
///
/// `publicar_em` is skipped when unset so inserts keep working against
/// backends whose schema predates the scheduling column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedia {
    pub modelo_id: i64,
    pub url: String,
    pub tipo: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publicar_em: Option<DateTime<Utc>>,
}

impl NewMedia {
    /// Copy of this payload with the scheduling column removed
    pub fn without_schedule(&self) -> Self {
        Self {
            publicar_em: None,
            ..self.clone()
        }
    }
}
