//! Filesystem byte source rooted at a directory.

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use super::ResourceSource;
use crate::core::AppResult;

/// Reads locators as paths relative to `root`.
///
/// Locators that try to leave the root (`..`, absolute paths) are rejected.
/// A leading `/` is treated as relative to the root, and any query string or
/// fragment is dropped.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    /// Create a source serving files below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, locator: &str) -> AppResult<PathBuf> {
        let path = locator.split(['?', '#']).next().unwrap_or(locator);
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            anyhow::bail!("locator `{locator}` escapes the source root");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceSource for FileSource {
    async fn read(&self, locator: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(locator)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))
    }
}
