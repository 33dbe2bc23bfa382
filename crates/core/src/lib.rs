//! Core types and shared functionality for fedicomments.
//!
//! This crate provides:
//! - Query normalization and the persistent root cache
//! - The aggregator that resolves queries and assembles comment threads
//! - Response model and remote API types
//! - Unified error types
//! - Configuration structures

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod remote;

pub use aggregator::Aggregator;
pub use cache::{RootCache, normalize_query, strip_marker};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use model::{Author, CacheLifetime, Comment, Stats, ThreadResult};
pub use remote::{Account, RemoteApi, RemoteError, SearchResults, Status, StatusContext};
