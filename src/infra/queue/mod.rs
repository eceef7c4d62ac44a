//! Dispatch queues.

pub mod memory;

pub use memory::InMemoryQueue;
