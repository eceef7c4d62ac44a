//! Byte sources the built-in fetchers read from.

use async_trait::async_trait;

use crate::core::AppResult;

#[cfg(feature = "http")]
pub mod http;
pub mod file;
pub mod memory;

#[cfg(feature = "http")]
pub use http::HttpSource;
pub use file::FileSource;
pub use memory::MemorySource;

/// Resolves a locator to raw bytes.
#[async_trait]
pub trait ResourceSource: Send + Sync + 'static {
    /// Read the full contents addressed by `locator`.
    async fn read(&self, locator: &str) -> AppResult<Vec<u8>>;
}
