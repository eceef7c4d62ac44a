//! Core scheduling abstractions: descriptors, cache, events, fetchers and the scheduler.

pub mod batch;
pub mod cache;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod handle;
pub mod scheduler;

pub use batch::BatchHandle;
pub use cache::ResourceCache;
pub use descriptor::{
    LoadedResource, MountId, PictureFormat, ResourceDescriptor, ResourceKind, DEFAULT_PRIORITY,
};
pub use error::{AppResult, LoaderError};
pub use events::{BatchProgress, EventBus, EventKind, ListenerId, LoadEvent, Subscription};
pub use fetcher::{FetchContext, FetcherRegistry, ResourceFetcher};
pub use handle::{LoadHandle, LoadResult};
pub use scheduler::{LoaderStats, ResourceScheduler, Spawn};
