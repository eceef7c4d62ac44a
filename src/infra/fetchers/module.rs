//! Executable module fetcher: reads source text and mounts it on the surface.

use std::sync::Arc;

use async_trait::async_trait;

use super::{decode_text, read_bytes};
use crate::core::{FetchContext, LoadedResource, LoaderError, ResourceDescriptor, ResourceFetcher};
use crate::infra::source::ResourceSource;
use crate::infra::surface::{RenderSurface, SlotKind};

/// Loads module source and inserts it into a [`RenderSurface`].
pub struct ModuleFetcher<S: ?Sized, R: ?Sized> {
    source: Arc<S>,
    surface: Arc<R>,
}

impl<S, R> ModuleFetcher<S, R>
where
    S: ResourceSource + ?Sized,
    R: RenderSurface + ?Sized,
{
    /// Create a fetcher reading from `source` and mounting on `surface`.
    pub const fn new(source: Arc<S>, surface: Arc<R>) -> Self {
        Self { source, surface }
    }
}

#[async_trait]
impl<S, R> ResourceFetcher for ModuleFetcher<S, R>
where
    S: ResourceSource + ?Sized,
    R: RenderSurface + ?Sized,
{
    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        ctx: FetchContext,
    ) -> Result<LoadedResource, LoaderError> {
        let bytes = read_bytes(self.source.as_ref(), &descriptor.identity, &descriptor.locator).await?;
        let source = decode_text(&descriptor.identity, bytes)?;
        // Mounting runs code on the host; skip it if the attempt was abandoned meanwhile.
        if ctx.cancel.is_cancelled() {
            return Err(LoaderError::fetch(&descriptor.identity, "attempt cancelled before mount"));
        }
        let mount = self
            .surface
            .mount(SlotKind::Module, &descriptor.identity, &source)?;
        Ok(LoadedResource::Module {
            mount,
            source_len: source.len(),
        })
    }
}
