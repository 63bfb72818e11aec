//! Viewport intersection host
//!
//! Widgets register through [`VisibilityObserver::observe`]; the host reports scroll
//! positions with [`Viewport::report_intersection`], which fans out to every live
//! registration. Cancelled registrations and those whose widget is gone are pruned on
//! the next report.

use embed_core::{ObserverOptions, VisibilityObserver, VisibilitySink, VisibilitySubscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Registration {
    options: ObserverOptions,
    sink: VisibilitySink,
    active: Arc<AtomicBool>,
}

struct ViewportSubscription {
    active: Arc<AtomicBool>,
}

impl VisibilitySubscription for ViewportSubscription {
    fn cancel(&mut self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Shared viewport that widgets observe
pub struct Viewport {
    supported: bool,
    registrations: Mutex<Vec<Registration>>,
}

impl Viewport {
    /// Viewport with intersection support
    pub fn new() -> Self {
        Self {
            supported: true,
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Viewport without intersection support; `observe` always returns `None`
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            registrations: Mutex::new(Vec::new()),
        }
    }

    /// Deliver an intersection ratio to every live registration
    ///
    /// Returns how many widgets were notified.
    pub fn report_intersection(&self, ratio: f64) -> usize {
        let mut registrations = self.registrations.lock();
        registrations.retain(|r| r.active.load(Ordering::SeqCst));

        let mut delivered = 0;
        registrations.retain(|r| {
            let alive = r.sink.notify(ratio);
            if alive {
                delivered += 1;
            }
            alive
        });
        delivered
    }

    /// Number of registrations that have not been cancelled
    pub fn active_observations(&self) -> usize {
        self.registrations
            .lock()
            .iter()
            .filter(|r| r.active.load(Ordering::SeqCst))
            .count()
    }

    /// Options of the live registrations
    pub fn observed_options(&self) -> Vec<ObserverOptions> {
        self.registrations
            .lock()
            .iter()
            .filter(|r| r.active.load(Ordering::SeqCst))
            .map(|r| r.options.clone())
            .collect()
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityObserver for Viewport {
    fn observe(
        &self,
        options: &ObserverOptions,
        sink: VisibilitySink,
    ) -> Option<Box<dyn VisibilitySubscription>> {
        if !self.supported {
            return None;
        }

        let active = Arc::new(AtomicBool::new(true));
        self.registrations.lock().push(Registration {
            options: options.clone(),
            sink,
            active: Arc::clone(&active),
        });
        tracing::trace!(
            root_margin = %options.root_margin,
            threshold = options.threshold,
            "observing widget"
        );

        Some(Box::new(ViewportSubscription { active }))
    }
}
