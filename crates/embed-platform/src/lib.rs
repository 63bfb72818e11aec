//! In-process platform adapters for lazy-embed
//!
//! This crate implements the capabilities `embed-core` consumes: a shared document hint
//! list, a viewport that delivers intersection notifications, and a renderer that keeps
//! the latest view for the host to read.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod render;
pub mod viewport;

pub use document::{DocumentHead, ResourceHint};
pub use render::SnapshotRenderer;
pub use viewport::Viewport;
