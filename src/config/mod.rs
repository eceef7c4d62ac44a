//! Configuration models for the loader scheduler.

pub mod loader;

pub use loader::{ConfigPatch, LoaderConfig, ENV_PREFIX};
