//! Shared render surface that module and stylesheet fetchers mount into.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::{LoaderError, MountId};

/// What a mount slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Executable module source.
    Module,
    /// Style sheet text.
    Stylesheet,
}

/// Environment hook receiving loaded code and styles.
///
/// This is the one place environment-specific behaviour lives: a browser host
/// would append script/style elements, a native host might hand the module to
/// an embedded interpreter.
pub trait RenderSurface: Send + Sync + 'static {
    /// Mount `content` under `identity`, returning a handle to it.
    fn mount(&self, slot: SlotKind, identity: &str, content: &str) -> Result<MountId, LoaderError>;
}

/// A recorded mount on an [`InMemorySurface`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mounted {
    /// Handle returned to the fetcher.
    pub id: MountId,
    /// Slot kind.
    pub slot: SlotKind,
    /// Resource identity.
    pub identity: String,
    /// Mounted text.
    pub content: String,
}

/// Surface that records mounts in memory, in mount order.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    next_id: AtomicU64,
    mounts: Mutex<Vec<Mounted>>,
}

impl InMemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything mounted so far.
    pub fn mounts(&self) -> Vec<Mounted> {
        self.mounts.lock().clone()
    }

    /// Number of mounts for `identity`.
    pub fn mount_count(&self, identity: &str) -> usize {
        self.mounts
            .lock()
            .iter()
            .filter(|m| m.identity == identity)
            .count()
    }
}

impl RenderSurface for InMemorySurface {
    fn mount(&self, slot: SlotKind, identity: &str, content: &str) -> Result<MountId, LoaderError> {
        let id = MountId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.mounts.lock().push(Mounted {
            id,
            slot,
            identity: identity.to_string(),
            content: content.to_string(),
        });
        tracing::debug!("mounted {:?} `{}` as {:?}", slot, identity, id);
        Ok(id)
    }
}
