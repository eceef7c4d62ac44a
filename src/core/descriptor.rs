//! Resource descriptors, kinds, and loaded references.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default dispatch priority for new descriptors.
pub const DEFAULT_PRIORITY: i32 = 1;

/// Category of resource, selecting which fetcher handles it.
///
/// The three built-in kinds cover pictures, executable modules and
/// stylesheets. `Other` lets callers register fetchers for additional kinds
/// without touching the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceKind {
    /// Raster or vector images.
    Picture,
    /// Executable code modules mounted on the render surface.
    Module,
    /// Style sheets mounted on the render surface.
    Stylesheet,
    /// Caller-defined kind.
    Other(String),
}

impl ResourceKind {
    /// Guess the kind from the locator's file extension.
    ///
    /// Query strings and fragments are ignored. Returns `None` when the
    /// extension is missing or unknown.
    pub fn infer(locator: &str) -> Option<Self> {
        let path = locator
            .split(['?', '#'])
            .next()
            .unwrap_or(locator);
        let file = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = file.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" => Some(Self::Picture),
            "js" | "mjs" | "cjs" => Some(Self::Module),
            "css" => Some(Self::Stylesheet),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Picture => "picture",
            Self::Module => "module",
            Self::Stylesheet => "stylesheet",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err("resource kind must not be empty".into());
        }
        Ok(match name.to_ascii_lowercase().as_str() {
            "picture" | "image" | "img" => Self::Picture,
            "module" | "script" => Self::Module,
            "stylesheet" | "style" | "css" => Self::Stylesheet,
            other => Self::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for ResourceKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Immutable request data describing one resource to load.
///
/// Only `attempt` changes after creation; the retry controller bumps it
/// each time the descriptor is fed back into the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Unique identity of the logical resource. Cache key.
    pub identity: String,
    /// Opaque locator passed verbatim to the fetcher.
    pub locator: String,
    /// Kind selecting the fetcher.
    pub kind: ResourceKind,
    /// Higher values dispatch first.
    pub priority: i32,
    /// Number of retries already performed.
    pub attempt: u32,
    /// Per-descriptor retry budget; falls back to the scheduler config.
    pub max_attempts: Option<u32>,
    /// Per-descriptor deadline; falls back to the scheduler config.
    pub timeout: Option<Duration>,
}

impl ResourceDescriptor {
    /// Create a descriptor whose identity is its locator.
    pub fn new(locator: impl Into<String>, kind: ResourceKind) -> Self {
        let locator = locator.into();
        Self {
            identity: locator.clone(),
            locator,
            kind,
            priority: DEFAULT_PRIORITY,
            attempt: 0,
            max_attempts: None,
            timeout: None,
        }
    }

    /// Shorthand for a picture descriptor.
    pub fn picture(locator: impl Into<String>) -> Self {
        Self::new(locator, ResourceKind::Picture)
    }

    /// Shorthand for an executable module descriptor.
    pub fn module(locator: impl Into<String>) -> Self {
        Self::new(locator, ResourceKind::Module)
    }

    /// Shorthand for a stylesheet descriptor.
    pub fn stylesheet(locator: impl Into<String>) -> Self {
        Self::new(locator, ResourceKind::Stylesheet)
    }

    /// Override the identity.
    #[must_use]
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Override the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Override the retry budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Override the deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Identifier of something mounted on a render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MountId(pub u64);

/// Image container formats recognised from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PictureFormat {
    /// Portable Network Graphics.
    Png,
    /// JPEG/JFIF.
    Jpeg,
    /// GIF87a/GIF89a.
    Gif,
    /// RIFF WebP.
    Webp,
    /// SVG markup.
    Svg,
}

/// A successfully loaded resource, shared between cache and callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedResource {
    /// Decoded picture header plus raw bytes.
    Picture {
        /// Container format.
        format: PictureFormat,
        /// Pixel width when the header exposes it.
        width: Option<u32>,
        /// Pixel height when the header exposes it.
        height: Option<u32>,
        /// Undecoded file contents.
        bytes: Arc<[u8]>,
    },
    /// Module mounted on the render surface.
    Module {
        /// Mount handle returned by the surface.
        mount: MountId,
        /// Length of the module source in bytes.
        source_len: usize,
    },
    /// Stylesheet mounted on the render surface.
    Stylesheet {
        /// Mount handle returned by the surface.
        mount: MountId,
        /// Number of top-level rule blocks.
        rule_count: usize,
    },
    /// Opaque payload produced by a custom fetcher.
    Raw {
        /// Loaded bytes.
        bytes: Arc<[u8]>,
    },
}

impl LoadedResource {
    /// Mount handle for surface-backed kinds.
    pub const fn mount(&self) -> Option<MountId> {
        match self {
            Self::Module { mount, .. } | Self::Stylesheet { mount, .. } => Some(*mount),
            Self::Picture { .. } | Self::Raw { .. } => None,
        }
    }
}
