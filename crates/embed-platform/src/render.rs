//! Snapshot renderer
//!
//! Keeps the most recent view and the attached player frame so a host (or a test) can
//! paint from them on its own schedule.

use embed_core::{EmbedFrame, EmbedView, RenderSink};
use parking_lot::RwLock;

#[derive(Debug, Default)]
struct Snapshot {
    view: Option<EmbedView>,
    frame: Option<EmbedFrame>,
    paints: usize,
    attaches: usize,
}

/// Renderer that records the latest state
#[derive(Debug, Default)]
pub struct SnapshotRenderer {
    snapshot: RwLock<Snapshot>,
}

impl SnapshotRenderer {
    /// Create an empty renderer
    pub fn new() -> Self {
        Self::default()
    }

    /// Last painted view
    pub fn view(&self) -> Option<EmbedView> {
        self.snapshot.read().view.clone()
    }

    /// Currently attached player frame
    pub fn frame(&self) -> Option<EmbedFrame> {
        self.snapshot.read().frame.clone()
    }

    /// Number of paints so far
    pub fn paint_count(&self) -> usize {
        self.snapshot.read().paints
    }

    /// Number of frames attached so far
    pub fn attach_count(&self) -> usize {
        self.snapshot.read().attaches
    }
}

impl RenderSink for SnapshotRenderer {
    fn paint(&self, view: &EmbedView) {
        let mut snapshot = self.snapshot.write();
        snapshot.view = Some(view.clone());
        snapshot.paints += 1;
    }

    fn attach_embed(&self, frame: &EmbedFrame) {
        let mut snapshot = self.snapshot.write();
        snapshot.frame = Some(frame.clone());
        snapshot.attaches += 1;
    }

    fn detach_embed(&self) {
        self.snapshot.write().frame = None;
    }
}
