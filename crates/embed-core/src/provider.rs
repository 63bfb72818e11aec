//! Provider URL resolution
//!
//! This module maps a video provider and video ID to every URL the widget needs:
//! the player embed URL, placeholder thumbnails, the metadata endpoint (Vimeo only)
//! and the origins worth pre-connecting to. Everything here is pure.

use crate::error::EmbedError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// YouTube privacy-enhanced embed host
const YOUTUBE_EMBED_HOST: &str = "https://www.youtube-nocookie.com";

/// YouTube thumbnail host
const YOUTUBE_IMAGE_HOST: &str = "https://i.ytimg.com";

/// Vimeo player host
const VIMEO_PLAYER_HOST: &str = "https://player.vimeo.com";

/// Vimeo image CDN
const VIMEO_IMAGE_HOST: &str = "https://i.vimeocdn.com";

/// Vimeo simple API origin
pub const VIMEO_API_ORIGIN: &str = "https://vimeo.com";

/// Resize and quality query shared by both Vimeo thumbnail formats
const VIMEO_IMAGE_QUERY: &str = "mw=1100&mh=619&q=70";

/// Origins warmed before a YouTube player loads
const YOUTUBE_PRECONNECT: [&str; 5] = [
    "https://s.ytimg.com",
    "https://www.youtube.com",
    "https://www.google.com",
    "https://googleads.g.doubleclick.net",
    "https://static.doubleclick.net",
];

/// Origins warmed before a Vimeo player loads
const VIMEO_PRECONNECT: [&str; 3] = [
    "https://f.vimeocdn.com",
    "https://player.vimeo.com",
    "https://i.vimeocdn.com",
];

/// Video hosting provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provider {
    /// YouTube
    YouTube,
    /// Vimeo
    Vimeo,
}

impl Provider {
    /// Get the provider as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::Vimeo => "vimeo",
        }
    }

    /// Parse a provider, treating anything that is not `youtube` as Vimeo
    ///
    /// Matches how embeds were historically configured; unknown values are logged.
    pub fn parse_lenient(value: &str) -> Self {
        match value.parse() {
            Ok(provider) => provider,
            Err(_) => {
                tracing::warn!(provider = value, "unknown video provider, falling back to vimeo");
                Provider::Vimeo
            }
        }
    }

    /// Origins to pre-connect to before the player is requested
    pub fn preconnect_domains(&self) -> &'static [&'static str] {
        match self {
            Provider::YouTube => &YOUTUBE_PRECONNECT,
            Provider::Vimeo => &VIMEO_PRECONNECT,
        }
    }

    /// Image host hinted as soon as thumbnail resolution starts
    pub fn thumbnail_host(&self) -> &'static str {
        match self {
            Provider::YouTube => "https://i.ytimg.com/",
            Provider::Vimeo => "https://i.vimeocdn.com/",
        }
    }

    /// Whether thumbnails need a metadata round trip
    pub fn needs_metadata(&self) -> bool {
        matches!(self, Provider::Vimeo)
    }

    /// Build the player embed URL
    pub fn embed_url(
        &self,
        video_id: &str,
        extra_params: &str,
        start_offset_seconds: u32,
    ) -> String {
        let id = urlencoding::encode(video_id);
        match self {
            Provider::YouTube => format!(
                "{}/embed/{}?autoplay=1&start={}&{}&modestbranding=1",
                YOUTUBE_EMBED_HOST, id, start_offset_seconds, extra_params
            ),
            Provider::Vimeo => format!(
                "{}/video/{}?autoplay=1&#t={}",
                VIMEO_PLAYER_HOST, id, start_offset_seconds
            ),
        }
    }

    /// Metadata endpoint for providers whose thumbnails are not derivable from the ID
    pub fn metadata_url(&self, video_id: &str) -> Option<String> {
        match self {
            Provider::YouTube => None,
            Provider::Vimeo => Some(format!(
                "{}/api/v2/video/{}.json",
                VIMEO_API_ORIGIN,
                urlencoding::encode(video_id)
            )),
        }
    }

    /// Thumbnails derivable from the video ID alone
    pub fn direct_thumbnails(&self, video_id: &str) -> Option<ThumbnailPair> {
        match self {
            Provider::YouTube => Some(ThumbnailPair::youtube(video_id)),
            Provider::Vimeo => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = EmbedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(Provider::YouTube),
            "vimeo" => Ok(Provider::Vimeo),
            other => Err(EmbedError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl TryFrom<String> for Provider {
    type Error = EmbedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Provider> for String {
    fn from(provider: Provider) -> Self {
        provider.as_str().to_string()
    }
}

/// Placeholder image in a modern format plus a universally supported fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailPair {
    /// WebP image URL
    pub webp: String,
    /// JPEG image URL
    pub jpeg: String,
}

impl ThumbnailPair {
    /// YouTube thumbnails derived directly from the video ID
    pub fn youtube(video_id: &str) -> Self {
        let id = urlencoding::encode(video_id);
        Self {
            webp: format!("{}/vi_webp/{}/hqdefault.webp", YOUTUBE_IMAGE_HOST, id),
            jpeg: format!("{}/vi/{}/hqdefault.jpg", YOUTUBE_IMAGE_HOST, id),
        }
    }

    /// Vimeo thumbnails built from an image ID found in metadata
    pub fn vimeo(image_id: &str) -> Self {
        Self {
            webp: format!("{}/video/{}.webp?{}", VIMEO_IMAGE_HOST, image_id, VIMEO_IMAGE_QUERY),
            jpeg: format!("{}/video/{}.jpg?{}", VIMEO_IMAGE_HOST, image_id, VIMEO_IMAGE_QUERY),
        }
    }
}

/// Everything derived from a provider and video ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEmbed {
    /// Player URL loaded on activation
    pub embed_url: String,
    /// Thumbnails, when derivable without a network call
    pub thumbnails: Option<ThumbnailPair>,
    /// Metadata endpoint, when thumbnails need one
    pub metadata_url: Option<String>,
    /// Origins to warm before activation
    pub preconnect_domains: &'static [&'static str],
}

/// Resolve all URLs for an embed
pub fn resolve(
    provider: Provider,
    video_id: &str,
    extra_params: &str,
    start_offset_seconds: u32,
) -> ResolvedEmbed {
    ResolvedEmbed {
        embed_url: provider.embed_url(video_id, extra_params, start_offset_seconds),
        thumbnails: provider.direct_thumbnails(video_id),
        metadata_url: provider.metadata_url(video_id),
        preconnect_domains: provider.preconnect_domains(),
    }
}
