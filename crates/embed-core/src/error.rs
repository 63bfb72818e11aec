//! Error types for embed configuration and thumbnail metadata

use thiserror::Error;

/// Errors that can occur while configuring an embed
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Provider value is not one of the built-in providers
    #[error("Unsupported video provider: {0}")]
    UnsupportedProvider(String),

    /// Invalid embed configuration
    #[error("Invalid embed configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for embed operations
pub type Result<T> = std::result::Result<T, EmbedError>;

/// Errors that can occur while resolving a thumbnail from provider metadata
///
/// None of these are fatal to a widget: the thumbnail simply stays empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("Metadata endpoint returned status {0}")]
    Status(u16),

    /// Body was not JSON or did not have the expected shape
    #[error("Failed to decode metadata: {0}")]
    Decode(String),

    /// Endpoint returned an empty array
    #[error("Metadata response contained no videos")]
    EmptyResponse,

    /// First entry had no `thumbnail_large` field
    #[error("Metadata has no large thumbnail")]
    MissingThumbnail,

    /// Image identifier could not be extracted from the thumbnail URL
    #[error("Cannot parse image id from thumbnail URL: {0}")]
    UnparseableImageId(String),
}
