//! Stylesheet fetcher: reads CSS text and mounts it on the surface.

use std::sync::Arc;

use async_trait::async_trait;

use super::{decode_text, read_bytes};
use crate::core::{FetchContext, LoadedResource, LoaderError, ResourceDescriptor, ResourceFetcher};
use crate::infra::source::ResourceSource;
use crate::infra::surface::{RenderSurface, SlotKind};

/// Count top-level rule blocks, skipping comments and quoted strings.
pub fn count_rules(css: &str) -> usize {
    let mut rules = 0;
    let mut depth = 0_usize;
    let mut chars = css.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            '"' | '\'' => {
                let mut escaped = false;
                for s in chars.by_ref() {
                    match s {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        _ if s == c => break,
                        _ => {}
                    }
                }
            }
            '{' => {
                if depth == 0 {
                    rules += 1;
                }
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    rules
}

/// Loads stylesheets and inserts them into a [`RenderSurface`].
pub struct StylesheetFetcher<S: ?Sized, R: ?Sized> {
    source: Arc<S>,
    surface: Arc<R>,
}

impl<S, R> StylesheetFetcher<S, R>
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
impl<S, R> ResourceFetcher for StylesheetFetcher<S, R>
where
    S: ResourceSource + ?Sized,
    R: RenderSurface + ?Sized,
{
    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        _ctx: FetchContext,
    ) -> Result<LoadedResource, LoaderError> {
        let bytes = read_bytes(self.source.as_ref(), &descriptor.identity, &descriptor.locator).await?;
        let css = decode_text(&descriptor.identity, bytes)?;
        let rule_count = count_rules(&css);
        let mount = self
            .surface
            .mount(SlotKind::Stylesheet, &descriptor.identity, &css)?;
        Ok(LoadedResource::Stylesheet { mount, rule_count })
    }
}
