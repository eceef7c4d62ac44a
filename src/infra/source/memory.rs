//! In-memory byte source for embedded assets and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::ResourceSource;
use crate::core::AppResult;

/// Locator → bytes map shared across clones.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Arc<RwLock<HashMap<String, Arc<[u8]>>>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the bytes served for `locator`.
    pub fn insert(&self, locator: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.entries.write().insert(locator.into(), Arc::from(bytes));
    }

    /// Stop serving `locator`.
    pub fn remove(&self, locator: &str) -> bool {
        self.entries.write().remove(locator).is_some()
    }
}

#[async_trait]
impl ResourceSource for MemorySource {
    async fn read(&self, locator: &str) -> AppResult<Vec<u8>> {
        self.entries
            .read()
            .get(locator)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| anyhow::anyhow!("no entry for `{locator}`"))
    }
}
