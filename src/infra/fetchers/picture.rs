//! Picture fetcher with magic-byte format sniffing.

use std::sync::Arc;

use async_trait::async_trait;

use super::read_bytes;
use crate::core::{
    FetchContext, LoadedResource, LoaderError, PictureFormat, ResourceDescriptor, ResourceFetcher,
};
use crate::infra::source::ResourceSource;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Identify the picture format and, where the header is cheap to read, its size.
///
/// Returns `None` for data that is not a recognised picture.
pub fn sniff_picture(bytes: &[u8]) -> Option<(PictureFormat, Option<(u32, u32)>)> {
    if bytes.starts_with(PNG_MAGIC) {
        // IHDR is always the first chunk: width and height are big-endian at 16..24.
        let dims = bytes.get(16..24).map(|h| {
            (
                u32::from_be_bytes([h[0], h[1], h[2], h[3]]),
                u32::from_be_bytes([h[4], h[5], h[6], h[7]]),
            )
        });
        return Some((PictureFormat::Png, dims));
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        let dims = bytes.get(6..10).map(|h| {
            (
                u32::from(u16::from_le_bytes([h[0], h[1]])),
                u32::from(u16::from_le_bytes([h[2], h[3]])),
            )
        });
        return Some((PictureFormat::Gif, dims));
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some((PictureFormat::Jpeg, None));
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some((PictureFormat::Webp, None));
    }
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with('<') && text.contains("<svg") {
        return Some((PictureFormat::Svg, None));
    }
    None
}

/// Loads pictures from a byte source.
pub struct PictureFetcher<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ResourceSource + ?Sized> PictureFetcher<S> {
    /// Create a fetcher reading from `source`.
    pub const fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: ResourceSource + ?Sized> ResourceFetcher for PictureFetcher<S> {
    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        _ctx: FetchContext,
    ) -> Result<LoadedResource, LoaderError> {
        let bytes = read_bytes(self.source.as_ref(), &descriptor.identity, &descriptor.locator).await?;
        let (format, dims) = sniff_picture(&bytes).ok_or_else(|| {
            LoaderError::fetch(&descriptor.identity, "unrecognised picture format")
        })?;
        Ok(LoadedResource::Picture {
            format,
            width: dims.map(|(w, _)| w),
            height: dims.map(|(_, h)| h),
            bytes: Arc::from(bytes),
        })
    }
}
