//! Activation state machine
//!
//! An [`EmbedWidget`] starts as a thumbnail placeholder and becomes a real player frame
//! on click, or on first intersection with the viewport when autoplay-on-visible is set.
//!
//! All inputs arrive as [`WidgetEvent`]s handled by [`EmbedWidget::dispatch`]. Platform
//! callbacks and the background metadata fetch post into the widget's queue, and the
//! owner drains it with [`EmbedWidget::pump`] or [`EmbedWidget::drain`], so state is only
//! ever mutated from one place. Lifecycle calls (`mount`, `update`, `unmount`) are
//! direct.
//!
//! Every identity (mount or change of video/provider) gets a new generation number.
//! Asynchronous results carry the generation that requested them and are dropped when
//! it is no longer current.

use crate::error::MetadataError;
use crate::metadata;
use crate::options::EmbedOptions;
use crate::platform::{ObserverOptions, Platform, VisibilitySink, VisibilitySubscription};
use crate::provider::{Provider, ThumbnailPair};
use crate::warmer::NetworkWarmer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Permissions granted to the player frame
pub const FRAME_ALLOW: &str =
    "accelerometer; autoplay; encrypted-media; gyroscope; picture-in-picture";

/// Widget phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Thumbnail and play affordance only
    Placeholder,
    /// Player frame constructed
    Activated,
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    /// Pointer entered the widget bounds
    PointerEnter,
    /// User clicked the placeholder
    Click,
    /// Viewport intersection reported by a visibility subscription
    Intersection {
        /// Generation the subscription was opened for
        generation: u64,
        /// Visible fraction of the widget
        ratio: f64,
    },
    /// Background thumbnail resolution finished
    ThumbnailResolved {
        /// Generation the fetch was started for
        generation: u64,
        /// Video the fetch was started for
        video_id: String,
        /// Resolved thumbnails or the reason there are none
        result: Result<ThumbnailPair, MetadataError>,
    },
}

/// Input a host may post from outside the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Pointer entered the widget bounds
    PointerEnter,
    /// User clicked the placeholder
    Click,
}

impl From<HostEvent> for WidgetEvent {
    fn from(event: HostEvent) -> Self {
        match event {
            HostEvent::PointerEnter => WidgetEvent::PointerEnter,
            HostEvent::Click => WidgetEvent::Click,
        }
    }
}

/// Queue handle for host input
///
/// Only pointer and click events can be posted. Intersections and thumbnail results
/// are queued by the widget's own subscriptions and fetch tasks.
#[derive(Debug, Clone)]
pub struct HostEventSender {
    tx: mpsc::UnboundedSender<WidgetEvent>,
}

impl HostEventSender {
    /// Queue an event, returning `false` once the widget has been dropped
    pub fn send(&self, event: HostEvent) -> bool {
        self.tx.send(event.into()).is_ok()
    }
}

/// Player frame handed to the renderer on activation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedFrame {
    /// Player URL
    pub src: String,
    /// Accessible name
    pub title: String,
    /// Feature policy
    pub allow: String,
    /// Whether fullscreen is allowed
    pub allow_fullscreen: bool,
}

/// What the renderer needs to paint the current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedView {
    /// Current phase
    pub phase: Phase,
    /// Provider, for provider-specific styling
    pub provider: Provider,
    /// WebP placeholder URL, empty until resolved
    pub webp_url: String,
    /// JPEG placeholder URL, empty until resolved
    pub jpeg_url: String,
    /// Accessible name for the placeholder and player
    pub title: String,
    /// Modifier class for the play button
    pub play_button_class: String,
}

/// Scoped visibility subscription, cancelled on drop
struct VisibilityWatch {
    subscription: Box<dyn VisibilitySubscription>,
}

impl Drop for VisibilityWatch {
    fn drop(&mut self) {
        self.subscription.cancel();
    }
}

/// One deferred video embed
pub struct EmbedWidget {
    id: Uuid,
    options: EmbedOptions,
    platform: Platform,
    warmer: NetworkWarmer,
    phase: Phase,
    thumbnails: Option<ThumbnailPair>,
    embed_url: Option<String>,
    generation: u64,
    mounted: bool,
    watch: Option<VisibilityWatch>,
    events_tx: mpsc::UnboundedSender<WidgetEvent>,
    events_rx: mpsc::UnboundedReceiver<WidgetEvent>,
}

impl EmbedWidget {
    /// Create an unmounted widget
    pub fn new(options: EmbedOptions, platform: Platform) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            id: Uuid::new_v4(),
            warmer: NetworkWarmer::new(Arc::clone(&platform.hints)),
            options,
            platform,
            phase: Phase::Placeholder,
            thumbnails: None,
            embed_url: None,
            generation: 0,
            mounted: false,
            watch: None,
            events_tx,
            events_rx,
        }
    }

    /// Instance identifier used in logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current options
    pub fn options(&self) -> &EmbedOptions {
        &self.options
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resolved thumbnails, if any
    pub fn thumbnails(&self) -> Option<&ThumbnailPair> {
        self.thumbnails.as_ref()
    }

    /// Player URL once activated
    pub fn embed_url(&self) -> Option<&str> {
        self.embed_url.as_deref()
    }

    /// Current identity generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the widget is mounted
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether a visibility subscription is live
    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    /// Whether provider connections have been warmed for this identity
    pub fn is_warm(&self) -> bool {
        self.warmer.is_warm()
    }

    /// Sender hosts use to post pointer and click events
    pub fn event_sender(&self) -> HostEventSender {
        HostEventSender {
            tx: self.events_tx.clone(),
        }
    }

    /// Snapshot for the renderer
    pub fn view(&self) -> EmbedView {
        let (webp_url, jpeg_url) = match &self.thumbnails {
            Some(pair) => (pair.webp.clone(), pair.jpeg.clone()),
            None => (String::new(), String::new()),
        };
        EmbedView {
            phase: self.phase,
            provider: self.options.provider,
            webp_url,
            jpeg_url,
            title: self.options.accessible_title(),
            play_button_class: format!("play-button--{}", self.options.provider),
        }
    }

    /// Attach the widget and start thumbnail resolution
    ///
    /// Vimeo thumbnails are fetched on the current Tokio runtime.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        tracing::debug!(
            instance = %self.id,
            provider = %self.options.provider,
            video_id = %self.options.video_id,
            "mounting embed"
        );
        self.begin_identity();
    }

    /// Detach the widget
    ///
    /// Cancels the visibility subscription. An attached player stays with the host until
    /// the next mount, which detaches it. An in-flight metadata fetch is left to finish
    /// and its result is ignored.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.watch = None;
        self.mounted = false;
        tracing::debug!(instance = %self.id, "unmounted embed");
    }

    /// Replace the options
    ///
    /// A different video ID or provider resets the widget to a fresh placeholder.
    pub fn update(&mut self, options: EmbedOptions) {
        let identity_changed = self.options.identity_differs(&options);
        let autoplay_changed = self.options.autoplay_on_visible != options.autoplay_on_visible;
        self.options = options;

        if !self.mounted {
            return;
        }

        if identity_changed {
            self.change_identity();
            return;
        }

        if autoplay_changed && self.phase == Phase::Placeholder {
            if self.options.autoplay_on_visible {
                self.start_watch();
            } else {
                self.watch = None;
            }
        }
        self.repaint();
    }

    /// Handle one event
    pub fn dispatch(&mut self, event: WidgetEvent) {
        if !self.mounted {
            tracing::trace!(instance = %self.id, ?event, "ignoring event while unmounted");
            return;
        }

        match event {
            WidgetEvent::PointerEnter => self.on_pointer_enter(),
            WidgetEvent::Click => {
                self.activate();
            }
            WidgetEvent::Intersection { generation, ratio } => {
                self.on_intersection(generation, ratio)
            }
            WidgetEvent::ThumbnailResolved {
                generation,
                video_id,
                result,
            } => self.on_thumbnail_resolved(generation, &video_id, result),
        }
    }

    /// Wait for the next queued event and handle it
    pub async fn pump(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Handle every event already queued, returning how many were handled
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Construct the player frame
    ///
    /// Returns `false` if the widget is not mounted or is already activated.
    pub fn activate(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        if self.phase == Phase::Activated {
            tracing::debug!(instance = %self.id, "already activated");
            return false;
        }

        self.watch = None;

        let src = self.options.provider.embed_url(
            &self.options.video_id,
            &self.options.extra_params,
            self.options.start_offset_seconds,
        );
        let frame = EmbedFrame {
            src: src.clone(),
            title: self.options.accessible_title(),
            allow: FRAME_ALLOW.to_string(),
            allow_fullscreen: true,
        };

        self.phase = Phase::Activated;
        self.embed_url = Some(src);
        self.platform.renderer.attach_embed(&frame);
        tracing::info!(
            instance = %self.id,
            provider = %self.options.provider,
            src = %frame.src,
            "activated embed"
        );
        self.repaint();
        true
    }

    fn on_pointer_enter(&mut self) {
        if self.phase == Phase::Placeholder {
            self.warmer.warm(self.options.provider);
        }
    }

    fn on_intersection(&mut self, generation: u64, ratio: f64) {
        if generation != self.generation || self.watch.is_none() {
            tracing::debug!(instance = %self.id, generation, "ignoring stale intersection");
            return;
        }
        if self.phase != Phase::Placeholder || ratio <= 0.0 {
            return;
        }

        self.watch = None;
        self.warmer.warm(self.options.provider);
        self.activate();
    }

    fn on_thumbnail_resolved(
        &mut self,
        generation: u64,
        video_id: &str,
        result: Result<ThumbnailPair, MetadataError>,
    ) {
        if generation != self.generation || video_id != self.options.video_id {
            tracing::debug!(
                instance = %self.id,
                generation,
                video_id,
                "discarding stale thumbnail"
            );
            return;
        }

        match result {
            Ok(pair) => {
                self.thumbnails = Some(pair);
                self.repaint();
            }
            Err(e) => {
                tracing::warn!(instance = %self.id, video_id, error = %e, "thumbnail unavailable");
            }
        }
    }

    fn change_identity(&mut self) {
        self.watch = None;
        tracing::debug!(
            instance = %self.id,
            provider = %self.options.provider,
            video_id = %self.options.video_id,
            "embed identity changed"
        );
        self.begin_identity();
    }

    fn begin_identity(&mut self) {
        if self.phase == Phase::Activated {
            self.platform.renderer.detach_embed();
        }
        self.generation += 1;
        self.phase = Phase::Placeholder;
        self.thumbnails = None;
        self.embed_url = None;
        self.warmer.reset();

        self.start_thumbnail_resolution();
        if self.options.autoplay_on_visible {
            self.start_watch();
        }
        self.repaint();
    }

    fn start_thumbnail_resolution(&mut self) {
        let provider = self.options.provider;
        self.warmer.warm_thumbnail_host(provider);

        if let Some(pair) = provider.direct_thumbnails(&self.options.video_id) {
            self.thumbnails = Some(pair);
            return;
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(instance = %self.id, "no async runtime, skipping thumbnail fetch");
                return;
            }
        };

        let fetcher = Arc::clone(&self.platform.metadata);
        let events = self.events_tx.clone();
        let generation = self.generation;
        let video_id = self.options.video_id.clone();

        handle.spawn(async move {
            let result = metadata::resolve_thumbnails(fetcher.as_ref(), provider, &video_id).await;
            // Receiver is gone if the widget was dropped
            let _ = events.send(WidgetEvent::ThumbnailResolved {
                generation,
                video_id,
                result,
            });
        });
    }

    fn start_watch(&mut self) {
        if self.watch.is_some() {
            return;
        }

        let sink = VisibilitySink::new(self.generation, self.events_tx.clone());
        match self
            .platform
            .visibility
            .observe(&ObserverOptions::default(), sink)
        {
            Some(subscription) => self.watch = Some(VisibilityWatch { subscription }),
            None => {
                tracing::debug!(instance = %self.id, "intersection observation unavailable");
            }
        }
    }

    fn repaint(&self) {
        if self.mounted {
            self.platform.renderer.paint(&self.view());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MetadataFetcher, RenderSink, ResourceHints, VisibilityObserver};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct Hints(Mutex<Vec<String>>);

    impl ResourceHints for Hints {
        fn add_preconnect_hint(&self, origin: &str) {
            self.0.lock().unwrap().push(origin.to_string());
        }
    }

    struct Subscription(Arc<AtomicUsize>);

    impl VisibilitySubscription for Subscription {
        fn cancel(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct Viewport {
        sinks: Mutex<Vec<VisibilitySink>>,
        cancels: Arc<AtomicUsize>,
        unsupported: bool,
    }

    impl Viewport {
        fn fire(&self, ratio: f64) {
            for sink in self.sinks.lock().unwrap().iter() {
                sink.notify(ratio);
            }
        }
    }

    impl VisibilityObserver for Viewport {
        fn observe(
            &self,
            _options: &ObserverOptions,
            sink: VisibilitySink,
        ) -> Option<Box<dyn VisibilitySubscription>> {
            if self.unsupported {
                return None;
            }
            self.sinks.lock().unwrap().push(sink);
            Some(Box::new(Subscription(Arc::clone(&self.cancels))))
        }
    }

    #[derive(Default)]
    struct Renderer {
        paints: Mutex<Vec<EmbedView>>,
        frames: Mutex<Vec<EmbedFrame>>,
        detaches: AtomicUsize,
    }

    impl RenderSink for Renderer {
        fn paint(&self, view: &EmbedView) {
            self.paints.lock().unwrap().push(view.clone());
        }

        fn attach_embed(&self, frame: &EmbedFrame) {
            self.frames.lock().unwrap().push(frame.clone());
        }

        fn detach_embed(&self) {
            self.detaches.fetch_add(1, Ordering::SeqCst);
        }
    }

    type Gate = oneshot::Receiver<Result<Value, MetadataError>>;

    /// Fetcher whose responses are released by the test, one gate per request
    #[derive(Default)]
    struct GatedFetcher {
        gates: Mutex<HashMap<String, VecDeque<Gate>>>,
        requests: AtomicUsize,
    }

    impl GatedFetcher {
        fn gate(&self, video_id: &str) -> oneshot::Sender<Result<Value, MetadataError>> {
            let (tx, rx) = oneshot::channel();
            let url = format!("https://vimeo.com/api/v2/video/{}.json", video_id);
            self.gates.lock().unwrap().entry(url).or_default().push_back(rx);
            tx
        }

        async fn wait_for_requests(&self, count: usize) {
            tokio::time::timeout(Duration::from_secs(5), async {
                while self.requests.load(Ordering::SeqCst) < count {
                    tokio::task::yield_now().await;
                }
            })
            .await
            .expect("requests within timeout");
        }
    }

    #[async_trait]
    impl MetadataFetcher for GatedFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value, MetadataError> {
            let gate = self
                .gates
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(VecDeque::pop_front);
            self.requests.fetch_add(1, Ordering::SeqCst);
            match gate {
                Some(rx) => rx
                    .await
                    .unwrap_or_else(|_| Err(MetadataError::Network("gate dropped".into()))),
                None => Err(MetadataError::Status(404)),
            }
        }
    }

    struct Harness {
        hints: Arc<Hints>,
        viewport: Arc<Viewport>,
        renderer: Arc<Renderer>,
        fetcher: Arc<GatedFetcher>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                hints: Arc::new(Hints::default()),
                viewport: Arc::new(Viewport::default()),
                renderer: Arc::new(Renderer::default()),
                fetcher: Arc::new(GatedFetcher::default()),
            }
        }

        fn platform(&self) -> Platform {
            Platform {
                hints: self.hints.clone(),
                visibility: self.viewport.clone(),
                metadata: self.fetcher.clone(),
                renderer: self.renderer.clone(),
            }
        }

        fn widget(&self, options: EmbedOptions) -> EmbedWidget {
            EmbedWidget::new(options, self.platform())
        }

        fn hint_count(&self, origin: &str) -> usize {
            self.hints.0.lock().unwrap().iter().filter(|h| *h == origin).count()
        }
    }

    fn thumbnail_payload(image_id: &str) -> Result<Value, MetadataError> {
        Ok(json!([{
            "thumbnail_large": format!("https://i.vimeocdn.com/video/{}_640.jpg", image_id)
        }]))
    }

    async fn pump(widget: &mut EmbedWidget) {
        tokio::time::timeout(Duration::from_secs(5), widget.pump())
            .await
            .expect("event within timeout");
    }

    #[test]
    fn test_youtube_mount_resolves_thumbnails_synchronously() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();

        assert_eq!(widget.phase(), Phase::Placeholder);
        let pair = widget.thumbnails().unwrap();
        assert_eq!(pair.webp, "https://i.ytimg.com/vi_webp/abc123/hqdefault.webp");
        assert_eq!(pair.jpeg, "https://i.ytimg.com/vi/abc123/hqdefault.jpg");
        assert_eq!(harness.hint_count("https://i.ytimg.com/"), 1);
        assert!(!widget.is_warm());
        assert!(!widget.is_watching());
    }

    #[test]
    fn test_click_activates_once() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();

        widget.dispatch(WidgetEvent::Click);
        widget.dispatch(WidgetEvent::Click);

        assert_eq!(widget.phase(), Phase::Activated);
        let frames = harness.renderer.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].src,
            "https://www.youtube-nocookie.com/embed/abc123?autoplay=1&start=0&&modestbranding=1"
        );
        assert_eq!(frames[0].title, "Play: Video");
        assert_eq!(frames[0].allow, FRAME_ALLOW);
        assert!(frames[0].allow_fullscreen);
    }

    #[test]
    fn test_pointer_enter_warms_without_activating() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();

        widget.dispatch(WidgetEvent::PointerEnter);
        widget.dispatch(WidgetEvent::PointerEnter);

        assert_eq!(widget.phase(), Phase::Placeholder);
        assert!(widget.is_warm());
        for domain in Provider::YouTube.preconnect_domains() {
            assert_eq!(harness.hint_count(domain), 1);
        }
    }

    #[test]
    fn test_events_before_mount_are_ignored() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));

        widget.dispatch(WidgetEvent::Click);
        assert!(!widget.activate());
        assert_eq!(widget.phase(), Phase::Placeholder);
        assert!(harness.renderer.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vimeo_thumbnails_arrive_after_fetch() {
        let harness = Harness::new();
        let gate = harness.fetcher.gate("9876");
        let mut widget = harness.widget(EmbedOptions::new("9876", Provider::Vimeo));
        widget.mount();

        assert!(widget.thumbnails().is_none());
        assert_eq!(widget.view().jpeg_url, "");
        assert_eq!(harness.hint_count("https://i.vimeocdn.com/"), 1);

        gate.send(thumbnail_payload("12345")).unwrap();
        pump(&mut widget).await;

        assert_eq!(
            widget.thumbnails().unwrap().jpeg,
            "https://i.vimeocdn.com/video/12345.jpg?mw=1100&mh=619&q=70"
        );
        let last = harness.renderer.paints.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.webp_url, "https://i.vimeocdn.com/video/12345.webp?mw=1100&mh=619&q=70");
    }

    #[tokio::test]
    async fn test_metadata_failure_leaves_widget_interactive() {
        let harness = Harness::new();
        let gate = harness.fetcher.gate("9876");
        let mut widget = harness.widget(EmbedOptions::new("9876", Provider::Vimeo));
        widget.mount();

        gate.send(Err(MetadataError::Network("connection reset".into()))).unwrap();
        pump(&mut widget).await;
        assert!(widget.thumbnails().is_none());

        widget.dispatch(WidgetEvent::Click);
        assert_eq!(widget.phase(), Phase::Activated);
        assert_eq!(widget.embed_url(), Some("https://player.vimeo.com/video/9876?autoplay=1&#t=0"));
    }

    #[tokio::test]
    async fn test_unparseable_thumbnail_is_not_fatal() {
        let harness = Harness::new();
        let gate = harness.fetcher.gate("9876");
        let mut widget = harness.widget(EmbedOptions::new("9876", Provider::Vimeo));
        widget.mount();

        gate.send(Ok(json!([{ "thumbnail_large": "https://i.vimeocdn.com/video/" }])))
            .unwrap();
        pump(&mut widget).await;
        assert!(widget.thumbnails().is_none());
        assert_eq!(widget.phase(), Phase::Placeholder);
    }

    #[tokio::test]
    async fn test_stale_metadata_does_not_overwrite_newer_thumbnail() {
        let harness = Harness::new();
        let old_gate = harness.fetcher.gate("111");
        let new_gate = harness.fetcher.gate("222");
        let mut widget = harness.widget(EmbedOptions::new("111", Provider::Vimeo));
        widget.mount();

        widget.update(EmbedOptions::new("222", Provider::Vimeo));

        new_gate.send(thumbnail_payload("2000")).unwrap();
        pump(&mut widget).await;
        assert_eq!(widget.thumbnails(), Some(&ThumbnailPair::vimeo("2000")));

        old_gate.send(thumbnail_payload("1000")).unwrap();
        pump(&mut widget).await;
        assert_eq!(widget.thumbnails(), Some(&ThumbnailPair::vimeo("2000")));
    }

    #[tokio::test]
    async fn test_metadata_for_earlier_generation_of_same_video_is_discarded() {
        let harness = Harness::new();
        let first_gate = harness.fetcher.gate("111");
        let latest_gate = harness.fetcher.gate("111");
        let other_gate = harness.fetcher.gate("222");
        let mut widget = harness.widget(EmbedOptions::new("111", Provider::Vimeo));

        widget.mount();
        harness.fetcher.wait_for_requests(1).await;
        widget.update(EmbedOptions::new("222", Provider::Vimeo));
        harness.fetcher.wait_for_requests(2).await;
        widget.update(EmbedOptions::new("111", Provider::Vimeo));
        harness.fetcher.wait_for_requests(3).await;

        latest_gate.send(thumbnail_payload("3000")).unwrap();
        pump(&mut widget).await;
        assert_eq!(widget.thumbnails(), Some(&ThumbnailPair::vimeo("3000")));

        other_gate.send(thumbnail_payload("2000")).unwrap();
        pump(&mut widget).await;
        first_gate.send(thumbnail_payload("1000")).unwrap();
        pump(&mut widget).await;

        assert_eq!(widget.options().video_id, "111");
        assert_eq!(widget.thumbnails(), Some(&ThumbnailPair::vimeo("3000")));
    }

    #[tokio::test]
    async fn test_metadata_after_unmount_is_discarded() {
        let harness = Harness::new();
        let gate = harness.fetcher.gate("9876");
        let mut widget = harness.widget(EmbedOptions::new("9876", Provider::Vimeo));
        widget.mount();
        widget.unmount();

        let paints_before = harness.renderer.paints.lock().unwrap().len();
        gate.send(thumbnail_payload("12345")).unwrap();
        pump(&mut widget).await;

        assert!(widget.thumbnails().is_none());
        assert_eq!(harness.renderer.paints.lock().unwrap().len(), paints_before);
    }

    #[test]
    fn test_visibility_activates_and_tears_down_watch() {
        let harness = Harness::new();
        let options = EmbedOptions::new("abc123", Provider::YouTube).with_autoplay_on_visible(true);
        let mut widget = harness.widget(options);
        widget.mount();
        assert!(widget.is_watching());

        harness.viewport.fire(0.0);
        widget.drain();
        assert_eq!(widget.phase(), Phase::Placeholder);
        assert!(widget.is_watching());

        harness.viewport.fire(0.25);
        harness.viewport.fire(0.5);
        widget.drain();

        assert_eq!(widget.phase(), Phase::Activated);
        assert!(widget.is_warm());
        assert!(!widget.is_watching());
        assert_eq!(harness.viewport.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(harness.renderer.frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_click_releases_watch() {
        let harness = Harness::new();
        let options = EmbedOptions::new("abc123", Provider::YouTube).with_autoplay_on_visible(true);
        let mut widget = harness.widget(options);
        widget.mount();

        widget.dispatch(WidgetEvent::Click);
        assert!(!widget.is_watching());
        assert_eq!(harness.viewport.cancels.load(Ordering::SeqCst), 1);

        harness.viewport.fire(1.0);
        widget.drain();
        assert_eq!(harness.renderer.frames.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_visibility_unavailable_falls_back_to_click() {
        let mut harness = Harness::new();
        harness.viewport = Arc::new(Viewport {
            unsupported: true,
            ..Default::default()
        });
        let options = EmbedOptions::new("abc123", Provider::YouTube).with_autoplay_on_visible(true);
        let mut widget = harness.widget(options);
        widget.mount();

        assert!(!widget.is_watching());
        widget.dispatch(WidgetEvent::Click);
        assert_eq!(widget.phase(), Phase::Activated);
    }

    #[test]
    fn test_identity_change_while_activated_resets() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();
        widget.dispatch(WidgetEvent::PointerEnter);
        widget.dispatch(WidgetEvent::Click);
        let first_generation = widget.generation();

        widget.update(EmbedOptions::new("xyz789", Provider::YouTube));

        assert_eq!(widget.phase(), Phase::Placeholder);
        assert!(widget.embed_url().is_none());
        assert!(!widget.is_warm());
        assert!(widget.generation() > first_generation);
        assert_eq!(harness.renderer.detaches.load(Ordering::SeqCst), 1);
        assert_eq!(
            widget.thumbnails().unwrap().jpeg,
            "https://i.ytimg.com/vi/xyz789/hqdefault.jpg"
        );

        widget.dispatch(WidgetEvent::Click);
        assert_eq!(
            widget.embed_url(),
            Some("https://www.youtube-nocookie.com/embed/xyz789?autoplay=1&start=0&&modestbranding=1")
        );
    }

    #[test]
    fn test_provider_change_is_identity_change() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("42", Provider::YouTube));
        widget.mount();
        let generation = widget.generation();

        widget.update(EmbedOptions::new("42", Provider::Vimeo));
        assert!(widget.generation() > generation);
        assert!(widget.thumbnails().is_none());
    }

    #[test]
    fn test_stale_intersection_after_identity_change_is_ignored() {
        let harness = Harness::new();
        let options = EmbedOptions::new("abc123", Provider::YouTube).with_autoplay_on_visible(true);
        let mut widget = harness.widget(options.clone());
        widget.mount();

        // Queue an intersection for the first identity, then switch videos
        harness.viewport.sinks.lock().unwrap()[0].notify(1.0);
        widget.update(EmbedOptions {
            video_id: "xyz789".into(),
            ..options
        });
        assert_eq!(harness.viewport.cancels.load(Ordering::SeqCst), 1);
        assert!(widget.is_watching());

        widget.drain();
        assert_eq!(widget.phase(), Phase::Placeholder);
    }

    #[test]
    fn test_non_identity_update_keeps_state() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();
        widget.dispatch(WidgetEvent::Click);

        widget.update(EmbedOptions::new("abc123", Provider::YouTube).with_title("Renamed"));
        assert_eq!(widget.phase(), Phase::Activated);
        assert_eq!(widget.view().title, "Play: Renamed");
        assert_eq!(harness.renderer.detaches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_toggling_autoplay_acquires_and_releases_watch() {
        let harness = Harness::new();
        let base = EmbedOptions::new("abc123", Provider::YouTube);
        let mut widget = harness.widget(base.clone());
        widget.mount();
        assert!(!widget.is_watching());

        widget.update(base.clone().with_autoplay_on_visible(true));
        assert!(widget.is_watching());

        widget.update(base);
        assert!(!widget.is_watching());
        assert_eq!(harness.viewport.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unmount_cancels_watch_and_ignores_events() {
        let harness = Harness::new();
        let options = EmbedOptions::new("abc123", Provider::YouTube).with_autoplay_on_visible(true);
        let mut widget = harness.widget(options);
        widget.mount();

        widget.unmount();
        widget.unmount();
        assert_eq!(harness.viewport.cancels.load(Ordering::SeqCst), 1);

        harness.viewport.fire(1.0);
        widget.drain();
        widget.dispatch(WidgetEvent::Click);
        assert_eq!(widget.phase(), Phase::Placeholder);
    }

    #[test]
    fn test_remount_after_activation_detaches_player() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();
        widget.dispatch(WidgetEvent::Click);

        widget.unmount();
        assert_eq!(harness.renderer.detaches.load(Ordering::SeqCst), 0);

        widget.mount();
        assert_eq!(widget.phase(), Phase::Placeholder);
        assert!(widget.embed_url().is_none());
        assert_eq!(harness.renderer.detaches.load(Ordering::SeqCst), 1);

        widget.dispatch(WidgetEvent::Click);
        let attached = harness.renderer.frames.lock().unwrap().len();
        let detached = harness.renderer.detaches.load(Ordering::SeqCst);
        assert_eq!(attached - detached, 1);
    }

    #[test]
    fn test_host_sender_queues_pointer_and_click() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("abc123", Provider::YouTube));
        widget.mount();

        let events = widget.event_sender();
        assert!(events.send(HostEvent::PointerEnter));
        assert!(events.send(HostEvent::Click));
        assert_eq!(widget.drain(), 2);
        assert!(widget.is_warm());
        assert_eq!(widget.phase(), Phase::Activated);

        drop(widget);
        assert!(!events.send(HostEvent::Click));
    }

    #[test]
    fn test_view_reflects_provider_and_title() {
        let harness = Harness::new();
        let options = EmbedOptions::new("9876", Provider::Vimeo)
            .with_title("Keynote")
            .with_play_label("Watch");
        let widget = harness.widget(options);

        let view = widget.view();
        assert_eq!(view.phase, Phase::Placeholder);
        assert_eq!(view.title, "Watch: Keynote");
        assert_eq!(view.play_button_class, "play-button--vimeo");
        assert_eq!(view.webp_url, "");
    }

    #[test]
    fn test_vimeo_mount_without_runtime_keeps_placeholder() {
        let harness = Harness::new();
        let mut widget = harness.widget(EmbedOptions::new("9876", Provider::Vimeo));
        widget.mount();
        assert!(widget.thumbnails().is_none());
        assert_eq!(widget.phase(), Phase::Placeholder);
    }
}
