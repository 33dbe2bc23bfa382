//! Read-through orchestration: resolve a query to roots, then assemble the thread.

use std::sync::Arc;

use crate::Error;
use crate::cache::{RootCache, normalize_query};
use crate::model::{ThreadResult, filter_comments, filter_roots, filter_stats};
use crate::remote::RemoteApi;

/// Resolves queries through the root cache and builds comment threads.
///
/// Holds no per-request state; clones share the cache and the client.
#[derive(Clone)]
pub struct Aggregator {
    cache: Arc<RootCache>,
    remote: Arc<dyn RemoteApi>,
    owner_id: Option<String>,
}

impl Aggregator {
    /// Create an aggregator. Only roots authored by `owner_id` qualify when it is set.
    pub fn new(cache: Arc<RootCache>, remote: Arc<dyn RemoteApi>, owner_id: Option<String>) -> Self {
        Self { cache, remote, owner_id: owner_id.filter(|id| !id.is_empty()) }
    }

    /// The shared root cache, for startup reporting and the shutdown flush.
    pub fn cache(&self) -> &Arc<RootCache> {
        &self.cache
    }

    /// Resolve a query to its root status ids.
    ///
    /// Cached entries, including empty ones, are returned without contacting
    /// the remote API. Search failures are not cached.
    pub async fn resolve(&self, query: &str) -> Result<Vec<String>, Error> {
        let query = normalize_query(query);

        if let Some(roots) = self.cache.get(&query) {
            tracing::debug!(query = %query, roots = roots.len(), "root cache hit");
            return Ok(roots);
        }

        tracing::info!(query = %query, "searching roots");

        let results = self.remote.search(&query).await.map_err(Error::resolution)?;
        let roots = filter_roots(&results.statuses, self.owner_id.as_deref());

        self.cache.put(query, roots.clone());
        Ok(roots)
    }

    /// Build the thread for a query from its first root.
    ///
    /// A query without roots yields an empty result, not an error.
    pub async fn get_result(&self, query: &str) -> Result<ThreadResult, Error> {
        let query = normalize_query(query);
        let roots = self.resolve(&query).await?;

        let Some(root) = roots.first() else {
            tracing::info!(query = %query, "no roots found");
            return Ok(ThreadResult::default());
        };

        tracing::info!(query = %query, root = %root, "querying comments");

        let (descendants, status) = tokio::try_join!(
            async { self.remote.fetch_descendants(root).await.map_err(Error::fetch) },
            async { self.remote.fetch_status(root).await.map_err(Error::fetch) },
        )?;

        let comments = filter_comments(&descendants, root);
        let mut stats = filter_stats(&status);
        stats.replies = comments.len() as u64;
        stats.root = root.clone();

        Ok(ThreadResult { comments, stats })
    }
}
