//! Modification-time gated memoization.
//!
//! [`MtimeCache`] remembers the result of an expensive computation together with
//! the modification time its primary path had when the result was produced. A
//! later lookup with the same key returns the stored result as long as the path's
//! mtime is unchanged, and recomputes otherwise.
//!
//! If the path cannot be stated (deleted, permission denied, ...) the cache is
//! bypassed entirely: the computation runs, its result is returned and nothing is
//! stored. Any error from the computation itself propagates.
//!
//! There is no eviction. A cache instance lives as long as its owning
//! [`ModManager`](crate::ModManager).

use crate::error::Result;
use crate::utils::mtime;
use camino::Utf8Path;
use std::collections::HashMap;
use std::hash::Hash;

struct CacheEntry<V> {
    value: V,
    mtime: f64,
}

/// Results keyed by `K`, each invalidated by the mtime of its primary path.
///
/// `K` usually combines the primary path with whatever other arguments the
/// computation takes.
pub struct MtimeCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K, V> Default for MtimeCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> MtimeCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key` if `path` has not been modified since it
    /// was stored, otherwise run `compute` and store its result.
    pub fn get_or_compute<F>(&mut self, path: &Utf8Path, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let current = match mtime(path) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!("Cannot stat {} ({}), bypassing cache", path, e);
                return compute();
            }
        };

        if let Some(entry) = self.entries.get(&key) {
            if entry.mtime == current {
                tracing::trace!("Cache hit for {}", path);
                return Ok(entry.value.clone());
            }
        }

        tracing::trace!("Cache miss for {}", path);
        let value = compute()?;
        self.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                mtime: current,
            },
        );
        Ok(value)
    }
}

#[cfg(test)]
impl<K, V> MtimeCache<K, V> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
