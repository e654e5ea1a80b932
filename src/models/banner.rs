//! Banner entity
//!
//! Promotional banners shown on the public site, ordered by `ordem`.
//! Field names match the `banners` table columns in the hosted backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a banner asset
///
/// Banners use `image`/`video` on the wire, unlike media items which
/// use `photo`/`video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerType {
    Image,
    Video,
}

impl BannerType {
    /// Wire representation used in backend rows
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerType::Image => "image",
            BannerType::Video => "video",
        }
    }
}

/// A promotional banner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Banner {
    /// Unique identifier (UUID)
    pub id: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Banner title
    pub titulo: String,
    /// Image or video
    pub tipo: BannerType,
    /// Public URL of the banner asset
    #[serde(default)]
    pub url: Option<String>,
    /// Optional click-through link
    #[serde(default)]
    pub link: Option<String>,
    /// Display position, ascending
    pub ordem: i32,
    /// Whether the banner is currently shown
    pub ativo: bool,
}

/// Insert payload for a banner row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBanner {
    pub titulo: String,
    pub tipo: BannerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub ordem: i32,
    pub ativo: bool,
}

/// Partial update payload for a banner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BannerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordem: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ativo: Option<bool>,
}

impl BannerPatch {
    /// Whether the patch carries no changes at all
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none()
            && self.url.is_none()
            && self.link.is_none()
            && self.ordem.is_none()
            && self.ativo.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_type_wire_format() {
        assert_eq!(BannerType::Image.as_str(), "image");
        assert_eq!(BannerType::Video.as_str(), "video");

        let json = serde_json::to_value(BannerType::Image).unwrap();
        assert_eq!(json, "image");
    }

    #[test]
    fn test_deserialize_row() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "created_at": "2024-01-01T00:00:00Z",
            "titulo": "Summer",
            "tipo": "image",
            "url": "https://cdn.example.com/b.jpg",
            "link": null,
            "ordem": 1,
            "ativo": true
        }"#;

        let banner: Banner = serde_json::from_str(json).unwrap();

        assert_eq!(banner.titulo, "Summer");
        assert_eq!(banner.tipo, BannerType::Image);
        assert!(banner.link.is_none());
        assert!(banner.ativo);
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = BannerPatch {
            ativo: Some(false),
            ..Default::default()
        };

        let json = serde_json::to_value(&patch).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 1);
        assert_eq!(obj["ativo"], false);
        assert!(BannerPatch::default().is_empty());
    }
}
