//! In-memory root cache mirrored to a JSON file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use super::persist::{self, RootMap};
use crate::Error;

#[derive(Debug, Default)]
struct Entries {
    roots: RootMap,
    /// Bumped on every insert; lets persistence skip stale snapshots.
    generation: u64,
}

/// Query to root-id cache.
///
/// Reads share the lock; inserts take it exclusively and then schedule a
/// background write of the whole map. The file on disk always holds a
/// complete snapshot, and never an older one than it already had.
#[derive(Debug)]
pub struct RootCache {
    path: PathBuf,
    entries: RwLock<Entries>,
    committed: Mutex<u64>,
}

impl RootCache {
    /// Create an empty cache that persists to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), entries: RwLock::new(Entries::default()), committed: Mutex::new(0) }
    }

    /// Load the cache from `path`.
    ///
    /// A missing, unreadable or corrupt file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let cache = Self::new(path);

        match persist::read(&cache.path) {
            Ok(Some(roots)) => {
                tracing::info!(path = %cache.path.display(), entries = roots.len(), "loaded root cache");
                cache.write_entries(|entries| entries.roots = roots);
            }
            Ok(None) => {
                tracing::info!(path = %cache.path.display(), "no root cache on disk, starting empty");
            }
            Err(e) => {
                tracing::warn!(path = %cache.path.display(), error = %e, "could not load root cache, starting empty");
            }
        }

        cache
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the roots for a normalized query.
    ///
    /// `Some(vec![])` means the query was searched before and nothing matched.
    pub fn get(&self, query: &str) -> Option<Vec<String>> {
        self.read_entries().roots.get(query).cloned()
    }

    /// Number of cached queries.
    pub fn len(&self) -> usize {
        self.read_entries().roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store the roots for a normalized query and schedule persistence.
    ///
    /// Returns without waiting for the write. Write failures are logged and
    /// dropped.
    pub fn put(self: &Arc<Self>, query: impl Into<String>, roots: Vec<String>) {
        self.write_entries(|entries| {
            entries.roots.insert(query.into(), roots);
            entries.generation += 1;
        });

        let cache = Arc::clone(self);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || cache.persist_logged());
            }
            Err(_) => cache.persist_logged(),
        }
    }

    /// Write the current snapshot to disk and wait for it.
    ///
    /// If a newer snapshot was committed while this one was being encoded,
    /// the stale one is discarded and the call still succeeds.
    pub fn persist(&self) -> Result<(), Error> {
        let (snapshot, generation) = {
            let entries = self.read_entries();
            (entries.roots.clone(), entries.generation)
        };

        let staged = persist::stage(&self.path, &snapshot)?;

        let mut committed = self.committed.lock().unwrap_or_else(PoisonError::into_inner);
        if generation < *committed {
            tracing::debug!(generation, committed = *committed, "skipping stale root cache snapshot");
            return Ok(());
        }
        staged.commit(&self.path)?;
        *committed = generation;

        tracing::debug!(path = %self.path.display(), entries = snapshot.len(), generation, "persisted root cache");
        Ok(())
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            tracing::error!(path = %self.path.display(), error = %e, "failed to persist root cache");
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self, f: impl FnOnce(&mut Entries)) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut entries);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    /// Poll until the cache file on disk satisfies `check`, or give up after 5s.
    pub(crate) async fn wait_for_disk(path: &Path, check: impl Fn(&RootMap) -> bool) -> RootMap {
        for _ in 0..100 {
            if let Ok(Some(roots)) = persist::read(path)
                && check(&roots)
            {
                return roots;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("cache file {} never reached the expected state", path.display());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = RootCache::load(dir.path().join("roots.json"));
        assert!(cache.is_empty());
        assert!(cache.get("/a").is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        std::fs::write(&path, b"not json").unwrap();

        let cache = RootCache::load(&path);
        assert!(cache.is_empty());
        assert_eq!(std::fs::read(&path).unwrap(), b"not json");
    }

    #[test]
    fn test_put_without_runtime_persists_inline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        let cache = Arc::new(RootCache::new(&path));

        cache.put("/a", vec!["1".into()]);

        let reloaded = RootCache::load(&path);
        assert_eq!(reloaded.get("/a"), Some(vec!["1".to_string()]));
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(RootCache::new(dir.path().join("roots.json")));

        cache.put("/a", vec!["1".into(), "2".into()]);
        cache.put("/empty", vec![]);

        assert_eq!(cache.get("/a"), Some(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(cache.get("/empty"), Some(vec![]));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_background_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        let cache = Arc::new(RootCache::new(&path));

        cache.put("/a", vec!["1".into()]);
        cache.put("/b", vec![]);

        wait_for_disk(&path, |roots| roots.len() == 2).await;

        let reloaded = RootCache::load(&path);
        assert_eq!(reloaded.get("/a"), Some(vec!["1".to_string()]));
        assert_eq!(reloaded.get("/b"), Some(vec![]));
    }

    #[tokio::test]
    async fn test_persist_failure_keeps_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("roots.json");
        let cache = Arc::new(RootCache::new(&path));

        cache.put("/a", vec!["1".into()]);

        assert!(matches!(cache.persist(), Err(Error::Persistence(_))));
        assert_eq!(cache.get("/a"), Some(vec!["1".to_string()]));
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_snapshot_is_not_committed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        let cache = RootCache::new(&path);

        cache.write_entries(|entries| {
            entries.roots.insert("/a".into(), vec!["1".into()]);
            entries.generation = 5;
        });
        cache.persist().unwrap();
        let committed = std::fs::read(&path).unwrap();

        cache.write_entries(|entries| {
            entries.roots.insert("/b".into(), vec![]);
            entries.generation = 3;
        });
        cache.persist().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), committed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_converge_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roots.json");
        let cache = Arc::new(RootCache::new(&path));

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.put(format!("/post/{i}"), vec![i.to_string()]) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let roots = wait_for_disk(&path, |roots| roots.len() == 32).await;
        assert_eq!(roots["/post/7"], vec!["7".to_string()]);
    }
}
