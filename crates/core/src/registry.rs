//! Concurrent catalog of shared files.
//!
//! The registry maps a public name (the file name clients see in URLs) to the
//! absolute path it was resolved to when the share was added. The HTTP layer
//! reads it from many tasks while the operator shell mutates it; every
//! operation takes the lock only for the map access itself, so no filesystem
//! work ever happens while it is held.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe mapping from public name to absolute filesystem path.
#[derive(Clone, Debug, Default)]
pub struct ShareRegistry {
    shares: Arc<RwLock<HashMap<String, PathBuf>>>,
}

impl ShareRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, PathBuf>> {
        self.shares.read().unwrap_or_else(|poisoned| {
            tracing::warn!("share registry RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, PathBuf>> {
        self.shares.write().unwrap_or_else(|poisoned| {
            tracing::warn!("share registry RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    /// Insert or overwrite a share. Last write wins on a name collision.
    pub fn put(&self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.write().insert(name.into(), path.into());
    }

    /// Remove a share, returning the path it pointed to.
    pub fn remove(&self, name: &str) -> Option<PathBuf> {
        self.write().remove(name)
    }

    /// Look up the path shared under `name`.
    pub fn get(&self, name: &str) -> Option<PathBuf> {
        self.read().get(name).cloned()
    }

    /// Snapshot of all public names.
    pub fn list_names(&self) -> BTreeSet<String> {
        self.read().keys().cloned().collect()
    }

    /// Number of shares.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is shared.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Share every non-empty regular file matching the filesystem glob `pattern`.
    ///
    /// The public name is the file name; the stored path is made absolute
    /// against the current working directory. Matching and metadata checks
    /// run before the lock is taken, then all entries are inserted in one
    /// write so readers see either none or all of them.
    ///
    /// Returns the matched paths as the glob produced them.
    pub fn add_glob(&self, pattern: &str) -> crate::Result<Vec<PathBuf>> {
        let mut resolved = Vec::new();
        for entry in glob::glob(pattern)? {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable glob entry");
                    continue;
                }
            };
            let Some((name, absolute)) = resolve_share(&path)? else {
                continue;
            };
            resolved.push((name, absolute, path));
        }

        let mut added = Vec::with_capacity(resolved.len());
        {
            let mut shares = self.write();
            for (name, absolute, path) in resolved {
                shares.insert(name, absolute);
                added.push(path);
            }
        }

        tracing::info!(pattern = %pattern, count = added.len(), "shares added");
        Ok(added)
    }

    /// Remove every share whose public name matches the glob `pattern`.
    ///
    /// Returns the removed names.
    pub fn remove_glob(&self, pattern: &str) -> crate::Result<Vec<String>> {
        let pattern = glob::Pattern::new(pattern)?;
        let mut removed = Vec::new();
        self.write().retain(|name, _| {
            if pattern.matches(name) {
                removed.push(name.clone());
                false
            } else {
                true
            }
        });

        tracing::info!(pattern = %pattern, count = removed.len(), "shares removed");
        Ok(removed)
    }
}

/// Resolve a glob match into `(public name, absolute path)`.
///
/// Directories, special files, empty files and matches whose metadata cannot
/// be read yield `None`.
fn resolve_share(path: &Path) -> crate::Result<Option<(String, PathBuf)>> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable match");
            return Ok(None);
        }
    };
    if !metadata.is_file() || metadata.len() == 0 {
        return Ok(None);
    }
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return Ok(None);
    };
    let absolute = std::path::absolute(path)?;
    Ok(Some((name, absolute)))
}
