//! Infrastructure adapters: dispatch queue, byte sources, fetchers and render surfaces.

pub mod fetchers;
pub mod queue;
pub mod source;
pub mod surface;

pub use fetchers::{default_registry, ModuleFetcher, PictureFetcher, StylesheetFetcher};
pub use queue::InMemoryQueue;
pub use source::{FileSource, MemorySource, ResourceSource};
pub use surface::{InMemorySurface, RenderSurface, SlotKind};
