//! Connection warm-up
//!
//! Issues `preconnect` hints for a provider's origins so DNS and TLS are done by the time
//! the player frame is requested. Hints are best effort and issued at most once per
//! widget identity.

use crate::platform::ResourceHints;
use crate::provider::Provider;
use std::sync::Arc;

/// Idempotent pre-connect issuer owned by one widget
pub struct NetworkWarmer {
    hints: Arc<dyn ResourceHints>,
    issued: bool,
}

impl NetworkWarmer {
    /// Create a warmer writing into the given hint list
    pub fn new(hints: Arc<dyn ResourceHints>) -> Self {
        Self { hints, issued: false }
    }

    /// Pre-connect to every origin of `provider`
    ///
    /// Returns `true` if hints were issued, `false` if this widget already warmed up.
    pub fn warm(&mut self, provider: Provider) -> bool {
        if self.issued {
            return false;
        }

        let domains = provider.preconnect_domains();
        for domain in domains {
            self.hints.add_preconnect_hint(domain);
        }
        self.issued = true;

        tracing::debug!(provider = %provider, hints = domains.len(), "warmed provider connections");
        true
    }

    /// Pre-connect to the provider's thumbnail host
    ///
    /// Independent of [`warm`](Self::warm) and not tracked.
    pub fn warm_thumbnail_host(&self, provider: Provider) {
        self.hints.add_preconnect_hint(provider.thumbnail_host());
    }

    /// Whether [`warm`](Self::warm) has issued hints
    pub fn is_warm(&self) -> bool {
        self.issued
    }

    /// Forget previous warm-up, e.g. after the widget's identity changed
    pub fn reset(&mut self) {
        self.issued = false;
    }
}
