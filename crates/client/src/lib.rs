//! Client code for fedicomments.
//!
//! This crate provides the Mastodon API client that backs the aggregator's
//! `RemoteApi` seam.

pub mod mastodon;

pub use mastodon::{MastodonClient, MastodonConfig, MastodonError};
