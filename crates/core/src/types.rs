//! Core type definitions for the AdScout engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a creative
pub type CreativeId = u64;

/// Identifier of a viewer (end user)
pub type UserId = u64;

/// Advertising format of a creative; one format per tab in the discovery UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdFormat {
    Push,
    Inpage,
    Facebook,
    Tiktok,
}

impl AdFormat {
    /// All formats, in tab order
    pub const ALL: [AdFormat; 4] = [
        AdFormat::Push,
        AdFormat::Inpage,
        AdFormat::Facebook,
        AdFormat::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Inpage => "inpage",
            Self::Facebook => "facebook",
            Self::Tiktok => "tiktok",
        }
    }

    /// Parse an exact format token
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "push" => Some(Self::Push),
            "inpage" => Some(Self::Inpage),
            "facebook" => Some(Self::Facebook),
            "tiktok" => Some(Self::Tiktok),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a creative as observed at its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreativeStatus {
    Active,
    Paused,
    Stopped,
}

/// A single ad creative
///
/// `is_processed` and `is_valid` together define the "ready" state: only
/// creatives that completed processing and passed validity checks are
/// eligible for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub id: CreativeId,
    pub format: AdFormat,
    pub status: CreativeStatus,
    pub title: String,
    pub description: String,
    /// ISO-2 country code, upper case
    pub country: Option<String>,
    /// ISO-2 language code, lower case
    pub language: Option<String>,
    /// Advertising network name token
    pub network: Option<String>,
    pub browser: Option<String>,
    pub operating_system: Option<String>,
    pub device: Option<String>,
    /// Aspect-ratio token of the main image, e.g. "16x9"
    pub image_size: Option<String>,
    pub is_adult: bool,
    pub is_processed: bool,
    pub is_valid: bool,
    pub main_image_url: Option<String>,
    pub icon_url: Option<String>,
    pub video_url: Option<String>,
    pub has_video: bool,
    pub social_likes: u64,
    pub social_comments: u64,
    pub social_shares: u64,
    pub created_at: DateTime<Utc>,
    pub external_created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
}

impl Creative {
    /// Ready creatives completed processing and passed validity checks
    pub fn is_ready(&self) -> bool {
        self.is_processed && self.is_valid
    }

    pub fn is_active(&self) -> bool {
        self.status == CreativeStatus::Active
    }

    /// Combined engagement metric used for popularity ordering
    pub fn engagement(&self) -> u64 {
        self.social_likes + self.social_comments + self.social_shares
    }
}

/// The projection of a creative returned to callers, annotated per viewer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreativeCard {
    pub id: CreativeId,
    pub title: String,
    pub description: String,
    pub category: AdFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    pub has_video: bool,
    pub is_adult: bool,
    pub is_active: bool,
    pub social_likes: u64,
    pub social_comments: u64,
    pub social_shares: u64,
    pub created_at: DateTime<Utc>,
    pub activity_date: DateTime<Utc>,
    pub is_favorite: bool,
}

impl CreativeCard {
    /// Build a card from a creative with the viewer-specific favorite flag
    pub fn from_creative(creative: &Creative, is_favorite: bool) -> Self {
        Self {
            id: creative.id,
            title: creative.title.clone(),
            description: creative.description.clone(),
            category: creative.format,
            country: creative.country.clone(),
            language: creative.language.clone(),
            network: creative.network.clone(),
            main_image_url: creative.main_image_url.clone(),
            icon_url: creative.icon_url.clone(),
            video_url: creative.video_url.clone(),
            has_video: creative.has_video,
            is_adult: creative.is_adult,
            is_active: creative.is_active(),
            social_likes: creative.social_likes,
            social_comments: creative.social_comments,
            social_shares: creative.social_shares,
            created_at: creative.created_at,
            activity_date: creative.last_seen_at,
            is_favorite,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens_round_trip() {
        for format in AdFormat::ALL {
            assert_eq!(AdFormat::parse(format.as_str()), Some(format));
        }
        assert_eq!(AdFormat::parse("banner"), None);
    }

    #[test]
    fn test_ready_requires_processed_and_valid() {
        let mut creative = test_support::creative(1);
        assert!(creative.is_ready());

        creative.is_valid = false;
        assert!(!creative.is_ready());

        creative.is_valid = true;
        creative.is_processed = false;
        assert!(!creative.is_ready());
    }

    #[test]
    fn test_engagement_sums_social_metrics() {
        let mut creative = test_support::creative(1);
        creative.social_likes = 10;
        creative.social_comments = 3;
        creative.social_shares = 2;
        assert_eq!(creative.engagement(), 15);
    }

    #[test]
    fn test_card_serializes_camel_case() {
        let creative = test_support::creative(7);
        let card = CreativeCard::from_creative(&creative, true);
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["isFavorite"], true);
        assert_eq!(json["category"], "push");
        assert_eq!(json["isActive"], true);
    }
}
