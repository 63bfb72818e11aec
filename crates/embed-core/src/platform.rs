//! Platform capabilities consumed by the widget
//!
//! The widget never touches a document, viewport or network stack directly. Hosts inject
//! these capabilities through [`Platform`], which keeps the state machine testable with
//! in-memory fakes.

use crate::activation::{EmbedFrame, EmbedView, WidgetEvent};
use crate::error::MetadataError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Document-level resource hints
///
/// Hints are append-only and shared by every widget on the page.
#[cfg_attr(test, mockall::automock)]
pub trait ResourceHints: Send + Sync {
    /// Add a `preconnect` hint for an origin
    fn add_preconnect_hint(&self, origin: &str);
}

/// HTTP fetch returning parsed JSON
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// GET `url` and parse the body as JSON
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, MetadataError>;
}

/// Viewport intersection options
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverOptions {
    /// Root element; `None` means the viewport
    pub root: Option<String>,
    /// Margin around the root
    pub root_margin: String,
    /// Intersection ratio that triggers a notification
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: "0px".to_string(),
            threshold: 0.0,
        }
    }
}

/// Live viewport-intersection subscription
pub trait VisibilitySubscription: Send {
    /// Stop delivering notifications. Must tolerate repeated calls.
    fn cancel(&mut self);
}

/// Viewport-intersection observation
pub trait VisibilityObserver: Send + Sync {
    /// Start observing the widget element
    ///
    /// Returns `None` when the platform has no intersection support.
    fn observe(
        &self,
        options: &ObserverOptions,
        sink: VisibilitySink,
    ) -> Option<Box<dyn VisibilitySubscription>>;
}

/// Rendering boundary
pub trait RenderSink: Send + Sync {
    /// Repaint from the current view
    fn paint(&self, view: &EmbedView);

    /// Insert the player frame
    fn attach_embed(&self, frame: &EmbedFrame);

    /// Remove a previously attached player frame
    fn detach_embed(&self);
}

/// Handle the platform uses to report intersections back to one widget
#[derive(Debug, Clone)]
pub struct VisibilitySink {
    generation: u64,
    events: mpsc::UnboundedSender<WidgetEvent>,
}

impl VisibilitySink {
    pub(crate) fn new(generation: u64, events: mpsc::UnboundedSender<WidgetEvent>) -> Self {
        Self { generation, events }
    }

    /// Report the current intersection ratio
    ///
    /// Returns `false` once the widget has been dropped.
    pub fn notify(&self, intersection_ratio: f64) -> bool {
        self.events
            .send(WidgetEvent::Intersection {
                generation: self.generation,
                ratio: intersection_ratio,
            })
            .is_ok()
    }
}

/// Bundle of capabilities a widget runs against
#[derive(Clone)]
pub struct Platform {
    /// Resource hint list
    pub hints: Arc<dyn ResourceHints>,
    /// Viewport observer
    pub visibility: Arc<dyn VisibilityObserver>,
    /// Metadata fetcher
    pub metadata: Arc<dyn MetadataFetcher>,
    /// Renderer
    pub renderer: Arc<dyn RenderSink>,
}
