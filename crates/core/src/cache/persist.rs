//! On-disk format and crash-safe writes for the root cache.
//!
//! The file is a single JSON object, `{"roots": {query: [id, ...]}}`. Writes go
//! to a uniquely named sibling temp file which is renamed over the target only
//! once it is fully written and synced.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

pub(crate) type RootMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    roots: RootMap,
}

#[derive(Serialize)]
struct CacheFileRef<'a> {
    roots: &'a RootMap,
}

/// Read the cache file. `Ok(None)` when it does not exist.
pub(crate) fn read(path: &Path) -> Result<Option<RootMap>, Error> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Load(format!("{}: {e}", path.display()))),
    };

    let file: CacheFile =
        serde_json::from_slice(&bytes).map_err(|e| Error::Load(format!("{}: {e}", path.display())))?;

    Ok(Some(file.roots))
}

/// A fully written temp file waiting to be renamed over the target.
pub(crate) struct Staged {
    file: tempfile::NamedTempFile,
}

impl Staged {
    /// Atomically replace `target` with the staged file.
    pub(crate) fn commit(self, target: &Path) -> Result<(), Error> {
        self.file
            .persist(target)
            .map_err(|e| Error::Persistence(format!("rename to {}: {}", target.display(), e.error)))?;
        Ok(())
    }
}

/// Encode `roots` into a fresh temp file next to `target`.
///
/// Dropping the returned [`Staged`] without committing removes the temp file.
pub(crate) fn stage(target: &Path, roots: &RootMap) -> Result<Staged, Error> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let bytes = serde_json::to_vec(&CacheFileRef { roots })?;

    let mut file = tempfile::Builder::new()
        .prefix(".fedicomments-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| Error::Persistence(format!("create temp file in {}: {e}", dir.display())))?;
    file.write_all(&bytes)?;
    file.as_file().sync_all()?;

    Ok(Staged { file })
}
