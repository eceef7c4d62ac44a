//! Built-in fetchers for pictures, modules and stylesheets.

use std::sync::Arc;

pub mod module;
pub mod picture;
pub mod stylesheet;

pub use module::ModuleFetcher;
pub use picture::{sniff_picture, PictureFetcher};
pub use stylesheet::{count_rules, StylesheetFetcher};

use crate::core::{FetcherRegistry, LoaderError, ResourceKind};
use crate::infra::source::ResourceSource;
use crate::infra::surface::RenderSurface;

/// Registry with the three built-in kinds reading from `source`.
pub fn default_registry<S, R>(source: Arc<S>, surface: Arc<R>) -> FetcherRegistry
where
    S: ResourceSource,
    R: RenderSurface,
{
    let mut registry = FetcherRegistry::new();
    registry
        .register(ResourceKind::Picture, PictureFetcher::new(Arc::clone(&source)))
        .register(
            ResourceKind::Module,
            ModuleFetcher::new(Arc::clone(&source), Arc::clone(&surface)),
        )
        .register(ResourceKind::Stylesheet, StylesheetFetcher::new(source, surface));
    registry
}

/// Read `locator` and fold source errors into a fetch failure.
async fn read_bytes<S: ResourceSource + ?Sized>(
    source: &S,
    identity: &str,
    locator: &str,
) -> Result<Vec<u8>, LoaderError> {
    source
        .read(locator)
        .await
        .map_err(|e| LoaderError::fetch(identity, format!("{e:#}")))
}

/// Decode UTF-8 text, tolerating a leading byte-order mark.
fn decode_text(identity: &str, bytes: Vec<u8>) -> Result<String, LoaderError> {
    let text = String::from_utf8(bytes)
        .map_err(|e| LoaderError::fetch(identity, format!("invalid UTF-8: {e}")))?;
    if let Some(rest) = text.strip_prefix('\u{feff}') {
        return Ok(rest.to_string());
    }
    Ok(text)
}
