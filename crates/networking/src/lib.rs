//! Networking for lazy-embed
//!
//! This crate provides the HTTP JSON fetcher used to look up provider thumbnail
//! metadata, with timeout and header configuration.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;

pub use client::{Error, FetcherConfig, HttpFetcher};
