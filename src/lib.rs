//! Deferred-loading video embeds
//!
//! `lazy-embed` shows a thumbnail placeholder for a YouTube or Vimeo video and only
//! builds the real player when the user is about to interact with it or when it scrolls
//! into view. This crate ties the core state machine to the bundled platform adapters
//! and HTTP fetcher.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logging;

pub use embed_core::{
    EmbedError, EmbedFrame, EmbedOptions, EmbedView, EmbedWidget, HostEvent, HostEventSender,
    MetadataError, MetadataFetcher, Phase, Platform, Provider, ThumbnailPair, WidgetEvent,
};
pub use embed_platform::{DocumentHead, SnapshotRenderer, Viewport};
pub use logging::{init_logging, LoggingConfig};
pub use networking::{FetcherConfig, HttpFetcher};

use std::sync::Arc;

/// Shared page-level adapters for a set of widgets
#[derive(Clone)]
pub struct Page {
    /// Resource hints shared by every widget
    pub head: Arc<DocumentHead>,
    /// Viewport shared by every widget
    pub viewport: Arc<Viewport>,
    /// Metadata fetcher shared by every widget
    pub fetcher: Arc<dyn MetadataFetcher>,
}

impl Page {
    /// Create a page fetching metadata over HTTP
    pub fn new(config: FetcherConfig) -> networking::client::Result<Self> {
        Ok(Self::with_fetcher(Arc::new(HttpFetcher::new(config)?)))
    }

    /// Create a page with a custom metadata fetcher
    pub fn with_fetcher(fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self {
            head: Arc::new(DocumentHead::new()),
            viewport: Arc::new(Viewport::new()),
            fetcher,
        }
    }

    /// Create a widget on this page rendering into `renderer`
    pub fn widget(&self, options: EmbedOptions, renderer: Arc<SnapshotRenderer>) -> EmbedWidget {
        let platform = Platform {
            hints: self.head.clone(),
            visibility: self.viewport.clone(),
            metadata: Arc::clone(&self.fetcher),
            renderer,
        };
        EmbedWidget::new(options, platform)
    }
}
