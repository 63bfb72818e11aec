//! Thumbnail metadata for providers that cannot derive thumbnails from the video ID
//!
//! Vimeo exposes a JSON endpoint returning an array of video records. The first record's
//! `thumbnail_large` URL embeds an image ID, which is all that is needed to build the
//! resized WebP and JPEG placeholders.

use crate::error::MetadataError;
use crate::platform::MetadataFetcher;
use crate::provider::{Provider, ThumbnailPair};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;

/// One entry of the Vimeo simple API video response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VimeoVideo {
    /// Numeric video ID
    #[serde(default)]
    pub id: Option<u64>,
    /// Video title
    #[serde(default)]
    pub title: Option<String>,
    /// Large thumbnail URL, e.g. `https://i.vimeocdn.com/video/12345_640.jpg`
    #[serde(default)]
    pub thumbnail_large: Option<String>,
}

fn image_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("static regex"))
}

/// Extract the image ID from a Vimeo thumbnail URL
///
/// The ID is the last path segment up to the first `_` (size suffix) or `.` (extension).
pub fn extract_image_id(thumbnail_url: &str) -> Result<String> {
    let segment = thumbnail_url
        .rsplit('/')
        .next()
        .unwrap_or(thumbnail_url);
    let id = segment.split(['_', '.']).next().unwrap_or_default();

    if image_id_pattern().is_match(id) {
        Ok(id.to_string())
    } else {
        Err(MetadataError::UnparseableImageId(thumbnail_url.to_string()))
    }
}

/// Build thumbnails from a raw metadata payload
pub fn thumbnails_from_payload(payload: serde_json::Value) -> Result<ThumbnailPair> {
    let videos: Vec<VimeoVideo> =
        serde_json::from_value(payload).map_err(|e| MetadataError::Decode(e.to_string()))?;

    let first = videos.into_iter().next().ok_or(MetadataError::EmptyResponse)?;
    let thumbnail = first.thumbnail_large.ok_or(MetadataError::MissingThumbnail)?;
    let image_id = extract_image_id(&thumbnail)?;

    Ok(ThumbnailPair::vimeo(&image_id))
}

/// Resolve thumbnails for a provider, fetching metadata when required
pub async fn resolve_thumbnails(
    fetcher: &dyn MetadataFetcher,
    provider: Provider,
    video_id: &str,
) -> Result<ThumbnailPair> {
    if let Some(pair) = provider.direct_thumbnails(video_id) {
        return Ok(pair);
    }

    let url = provider
        .metadata_url(video_id)
        .ok_or_else(|| MetadataError::Decode(format!("no metadata endpoint for {}", provider)))?;
    let payload = fetcher.fetch_json(&url).await?;
    thumbnails_from_payload(payload)
}
