//! In-memory cache of resolved resources keyed by identity.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::LoadedResource;

/// Identity → resolved reference map.
///
/// Entries persist until evicted; there is no automatic expiry. Reads take a
/// shared lock so cache-hit lookups do not contend with each other.
#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<HashMap<String, Arc<LoadedResource>>>,
}

impl ResourceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a resolved reference.
    pub fn get(&self, identity: &str) -> Option<Arc<LoadedResource>> {
        self.entries.read().get(identity).cloned()
    }

    /// Store a resolved reference, replacing any previous entry.
    pub fn set(&self, identity: impl Into<String>, reference: Arc<LoadedResource>) {
        self.entries.write().insert(identity.into(), reference);
    }

    /// Evict one identity, or everything when `identity` is `None`.
    ///
    /// Returns the number of entries removed.
    pub fn evict(&self, identity: Option<&str>) -> usize {
        let mut entries = self.entries.write();
        match identity {
            Some(id) => usize::from(entries.remove(id).is_some()),
            None => {
                let removed = entries.len();
                entries.clear();
                removed
            }
        }
    }

    /// Whether `identity` is cached.
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.read().contains_key(identity)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
