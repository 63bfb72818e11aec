//! Core logic for deferred video embeds
//!
//! This crate contains the provider URL resolver, the connection warmer and the
//! activation state machine that decides when a placeholder becomes a real player.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activation;
pub mod error;
pub mod metadata;
pub mod options;
pub mod platform;
pub mod provider;
pub mod warmer;

pub use activation::{
    EmbedFrame, EmbedView, EmbedWidget, HostEvent, HostEventSender, Phase, WidgetEvent,
};
pub use error::{EmbedError, MetadataError, Result};
pub use options::EmbedOptions;
pub use platform::{
    MetadataFetcher, ObserverOptions, Platform, RenderSink, ResourceHints, VisibilityObserver,
    VisibilitySink, VisibilitySubscription,
};
pub use provider::{Provider, ResolvedEmbed, ThumbnailPair};
pub use warmer::NetworkWarmer;
