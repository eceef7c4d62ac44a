//! Kind-specific fetcher abstraction and the registry keyed by kind.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::{LoadedResource, LoaderError, ResourceDescriptor, ResourceKind};

/// Per-attempt context handed to a fetcher.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Zero-based retry count of this attempt.
    pub attempt: u32,
    /// Cancelled when the attempt times out or the scheduler shuts down.
    ///
    /// The scheduler drops the fetch future in both cases; fetchers that hand
    /// work to background tasks should watch this token to stop that work.
    pub cancel: CancellationToken,
}

/// Loads one resource kind.
///
/// Implementations that insert into a shared render surface (modules,
/// stylesheets) do so inside `fetch`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use resource_scheduler::core::{
///     FetchContext, LoadedResource, LoaderError, ResourceDescriptor, ResourceFetcher,
/// };
///
/// struct FontFetcher;
///
/// #[async_trait]
/// impl ResourceFetcher for FontFetcher {
///     async fn fetch(
///         &self,
///         descriptor: &ResourceDescriptor,
///         _ctx: FetchContext,
///     ) -> Result<LoadedResource, LoaderError> {
///         let bytes = std::fs::read(&descriptor.locator)
///             .map_err(|e| LoaderError::fetch(&descriptor.identity, e.to_string()))?;
///         Ok(LoadedResource::Raw { bytes: bytes.into() })
///     }
/// }
/// ```
#[async_trait]
pub trait ResourceFetcher: Send + Sync + 'static {
    /// Load the resource described by `descriptor`.
    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        ctx: FetchContext,
    ) -> Result<LoadedResource, LoaderError>;
}

/// Fetchers keyed by resource kind.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<ResourceKind, Arc<dyn ResourceFetcher>>,
}

impl fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherRegistry")
            .field("kinds", &self.fetchers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FetcherRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the fetcher for `kind`.
    pub fn register<F>(&mut self, kind: ResourceKind, fetcher: F) -> &mut Self
    where
        F: ResourceFetcher,
    {
        self.fetchers.insert(kind, Arc::new(fetcher));
        self
    }

    /// Register an already shared fetcher.
    pub fn register_shared(&mut self, kind: ResourceKind, fetcher: Arc<dyn ResourceFetcher>) -> &mut Self {
        self.fetchers.insert(kind, fetcher);
        self
    }

    /// Fetcher for `kind`, or [`LoaderError::UnsupportedKind`].
    pub fn get(&self, kind: &ResourceKind) -> Result<Arc<dyn ResourceFetcher>, LoaderError> {
        self.fetchers
            .get(kind)
            .cloned()
            .ok_or_else(|| LoaderError::UnsupportedKind(kind.to_string()))
    }

    /// Whether a fetcher is registered for `kind`.
    pub fn supports(&self, kind: &ResourceKind) -> bool {
        self.fetchers.contains_key(kind)
    }
}
