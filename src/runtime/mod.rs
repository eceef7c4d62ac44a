//! Runtime adapters and the JSON request surface.

pub mod api;
pub mod tokio_spawner;

pub use api::{load_json_batch, parse_batch, parse_batch_entries, LoadRequest, StatsResponse};
pub use tokio_spawner::TokioSpawner;
