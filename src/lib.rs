//! # Resource Scheduler
//!
//! An asynchronous, priority-driven loader for pictures, executable modules and
//! style sheets.
//!
//! Callers describe what they need with a [`core::ResourceDescriptor`]. The
//! scheduler queues descriptors by priority, runs at most `max_concurrent`
//! fetches at a time, races each fetch against a deadline, retries failures
//! with exponential backoff, and caches every success so repeat requests never
//! hit the network twice.
//!
//! ## Key Features
//!
//! - **Priority Queue**: Higher priorities dispatch first; ties are FIFO
//! - **Concurrency Gate**: Bounded in-flight loads, re-drained on every completion
//! - **Timeout Guard**: Per-resource deadlines; late results are discarded
//! - **Retry Controller**: `max_attempts` retries with exponential backoff
//! - **Resource Cache**: Identity-keyed, with joining of concurrent first requests
//! - **Event Bus**: `start`, `progress`, `complete`, `error`, `retry`, `queue-drained`
//! - **Batch Coordinator**: One ordered result list per batch; never fails as a whole
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use resource_scheduler::builders::SchedulerBuilder;
//! use resource_scheduler::core::{EventKind, ResourceDescriptor};
//! use resource_scheduler::infra::{FileSource, InMemorySurface};
//!
//! let surface = Arc::new(InMemorySurface::new());
//! let scheduler = SchedulerBuilder::from_env()?
//!     .with_default_fetchers(Arc::new(FileSource::new("./public")), Arc::clone(&surface))
//!     .build()?;
//!
//! let sub = scheduler.on(EventKind::Error, |event| {
//!     eprintln!("failed: {:?}", event.error);
//! });
//!
//! let results = scheduler
//!     .load_batch(vec![
//!         ResourceDescriptor::stylesheet("css/theme.css").with_priority(10),
//!         ResourceDescriptor::module("js/app.js"),
//!         ResourceDescriptor::picture("icons/home.png"),
//!     ])
//!     .await;
//! sub.unsubscribe();
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs` and `tests/batch_test.rs`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: descriptors, cache, events, fetchers and the scheduler.
pub mod core;
/// Configuration models for the loader.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Infrastructure adapters for queues, byte sources, fetchers and render surfaces.
pub mod infra;
/// Runtime adapters and the JSON request surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
