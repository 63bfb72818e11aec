//! Document-level resource hints
//!
//! One [`DocumentHead`] is shared by every widget on a page. Hints are only ever appended;
//! duplicates from different widgets are kept and are harmless.

use embed_core::ResourceHints;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A `<link>` resource hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHint {
    /// Link relation, e.g. `preconnect`
    pub rel: String,
    /// Target origin
    pub href: String,
    /// Whether the hint is cross-origin
    pub cross_origin: bool,
}

impl ResourceHint {
    /// Create a cross-origin preconnect hint
    pub fn preconnect(href: impl Into<String>) -> Self {
        Self {
            rel: "preconnect".to_string(),
            href: href.into(),
            cross_origin: true,
        }
    }
}

/// Append-only hint list standing in for the document head
#[derive(Debug, Default)]
pub struct DocumentHead {
    hints: RwLock<Vec<ResourceHint>>,
}

impl DocumentHead {
    /// Create an empty head
    pub fn new() -> Self {
        Self::default()
    }

    /// All hints in insertion order
    pub fn hints(&self) -> Vec<ResourceHint> {
        self.hints.read().clone()
    }

    /// Number of hints
    pub fn len(&self) -> usize {
        self.hints.read().len()
    }

    /// Whether no hints were added
    pub fn is_empty(&self) -> bool {
        self.hints.read().is_empty()
    }

    /// Number of hints targeting `href`
    pub fn count_for(&self, href: &str) -> usize {
        self.hints.read().iter().filter(|hint| hint.href == href).count()
    }
}

impl ResourceHints for DocumentHead {
    fn add_preconnect_hint(&self, origin: &str) {
        tracing::trace!(origin, "adding preconnect hint");
        self.hints.write().push(ResourceHint::preconnect(origin));
    }
}
