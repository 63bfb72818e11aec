//! Embed configuration
//!
//! Options can be built in code, deserialized from JSON, or read from the attribute map of
//! a `<video-embed>` element.

use crate::error::{EmbedError, Result};
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default accessible title
pub const DEFAULT_TITLE: &str = "Video";

/// Default play button label
pub const DEFAULT_PLAY_LABEL: &str = "Play";

/// Recognized options for one embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedOptions {
    /// Provider-assigned video ID
    pub video_id: String,
    /// Hosting provider
    pub provider: Provider,
    /// Video title used in the accessible name
    #[serde(default = "default_title")]
    pub title: String,
    /// Play button label used in the accessible name
    #[serde(default = "default_play_label")]
    pub play_label: String,
    /// Raw query fragment appended to YouTube embed URLs
    #[serde(default)]
    pub extra_params: String,
    /// Activate automatically once the widget scrolls into view
    #[serde(default)]
    pub autoplay_on_visible: bool,
    /// Playback start offset
    #[serde(default)]
    pub start_offset_seconds: u32,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_play_label() -> String {
    DEFAULT_PLAY_LABEL.to_string()
}

impl EmbedOptions {
    /// Create options with defaults for everything but identity
    pub fn new(video_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            video_id: video_id.into(),
            provider,
            title: default_title(),
            play_label: default_play_label(),
            extra_params: String::new(),
            autoplay_on_visible: false,
            start_offset_seconds: 0,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the play label
    pub fn with_play_label(mut self, label: impl Into<String>) -> Self {
        self.play_label = label.into();
        self
    }

    /// Set extra YouTube query parameters
    pub fn with_extra_params(mut self, params: impl Into<String>) -> Self {
        self.extra_params = params.into();
        self
    }

    /// Enable or disable activation on visibility
    pub fn with_autoplay_on_visible(mut self, enabled: bool) -> Self {
        self.autoplay_on_visible = enabled;
        self
    }

    /// Set the start offset
    pub fn with_start_offset(mut self, seconds: u32) -> Self {
        self.start_offset_seconds = seconds;
        self
    }

    /// Parse and validate options from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from element attributes, rejecting unknown providers
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Result<Self> {
        let provider = required(attributes, "video-provider")?.parse()?;
        Self::from_attributes_with(attributes, provider)
    }

    /// Parse options from element attributes, treating unknown providers as Vimeo
    pub fn from_attributes_lenient(attributes: &HashMap<String, String>) -> Result<Self> {
        let provider = attributes
            .get("video-provider")
            .map(|value| Provider::parse_lenient(value))
            .unwrap_or(Provider::Vimeo);
        Self::from_attributes_with(attributes, provider)
    }

    fn from_attributes_with(
        attributes: &HashMap<String, String>,
        provider: Provider,
    ) -> Result<Self> {
        let mut options = Self::new(required(attributes, "video-id")?, provider);

        if let Some(title) = attributes.get("video-title") {
            options.title = title.clone();
        }
        if let Some(label) = attributes.get("play-label") {
            options.play_label = label.clone();
        }
        if let Some(params) = attributes.get("youtube-params") {
            options.extra_params = params.clone();
        }
        if let Some(autoplay) = attributes.get("autoplay") {
            options.autoplay_on_visible = autoplay != "false";
        }
        if let Some(start) = attributes.get("start-at") {
            options.start_offset_seconds = start.trim().parse().map_err(|_| {
                EmbedError::InvalidConfig(format!(
                    "start-at must be whole seconds, got {:?}",
                    start
                ))
            })?;
        }

        options.validate()?;
        Ok(options)
    }

    /// Check invariants the URL builders rely on
    pub fn validate(&self) -> Result<()> {
        if self.video_id.is_empty() {
            return Err(EmbedError::InvalidConfig("videoId is required".to_string()));
        }
        if self.video_id.chars().any(char::is_whitespace) {
            return Err(EmbedError::InvalidConfig(format!(
                "videoId must not contain whitespace: {:?}",
                self.video_id
            )));
        }
        Ok(())
    }

    /// Whether `other` refers to a different video
    pub fn identity_differs(&self, other: &EmbedOptions) -> bool {
        self.video_id != other.video_id || self.provider != other.provider
    }

    /// Accessible name shared by the placeholder and the player frame
    pub fn accessible_title(&self) -> String {
        format!("{}: {}", self.play_label, self.title)
    }
}

fn required<'a>(attributes: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    attributes
        .get(name)
        .map(|value| value.as_str())
        .ok_or_else(|| EmbedError::InvalidConfig(format!("missing attribute {}", name)))
}
