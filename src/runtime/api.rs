//! JSON-facing request/response models.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;
use crate::core::{
    BatchHandle, LoaderError, LoaderStats, ResourceDescriptor, ResourceKind, ResourceScheduler,
    Spawn, DEFAULT_PRIORITY,
};

/// One resource request as it arrives over JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Identity; defaults to the locator.
    #[serde(default, alias = "id")]
    pub identity: Option<String>,
    /// Locator passed to the fetcher.
    #[serde(alias = "url")]
    pub locator: String,
    /// Kind; inferred from the locator's extension when absent.
    #[serde(default, alias = "type")]
    pub kind: Option<ResourceKind>,
    /// Dispatch priority.
    #[serde(default)]
    pub priority: Option<i32>,
    /// Retry budget override.
    #[serde(default, alias = "maxAttempts")]
    pub max_attempts: Option<u32>,
    /// Deadline override in milliseconds.
    #[serde(default, alias = "timeoutMs")]
    pub timeout_ms: Option<u64>,
}

impl LoadRequest {
    /// Convert into a descriptor, inferring the kind if needed.
    pub fn into_descriptor(self) -> Result<ResourceDescriptor, LoaderError> {
        let kind = match self.kind {
            Some(kind) => kind,
            None => ResourceKind::infer(&self.locator).ok_or_else(|| {
                LoaderError::InvalidInput(format!("cannot infer kind of `{}`", self.locator))
            })?,
        };
        let mut descriptor = ResourceDescriptor::new(self.locator, kind)
            .with_priority(self.priority.unwrap_or(DEFAULT_PRIORITY));
        if let Some(identity) = self.identity {
            descriptor = descriptor.with_identity(identity);
        }
        descriptor.max_attempts = self.max_attempts;
        descriptor.timeout = self.timeout_ms.map(Duration::from_millis);
        Ok(descriptor)
    }
}

/// Parse a JSON batch, one entry per array element.
///
/// Elements that do not describe a loadable resource become
/// [`LoaderError::InvalidInput`] in their slot. Anything other than an array
/// yields an empty list. Both cases are logged, never raised.
pub fn parse_batch_entries(input: &serde_json::Value) -> Vec<Result<ResourceDescriptor, LoaderError>> {
    let Some(items) = input.as_array() else {
        tracing::warn!(
            "{}",
            LoaderError::InvalidInput("batch payload is not a list".into())
        );
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let parsed = serde_json::from_value::<LoadRequest>(item.clone())
                .map_err(|e| LoaderError::InvalidInput(e.to_string()))
                .and_then(LoadRequest::into_descriptor);
            if let Err(e) = &parsed {
                tracing::warn!("batch entry {} rejected: {}", index, e);
            }
            parsed
        })
        .collect()
}

/// Parse a JSON batch into descriptors, dropping entries that fail to parse.
pub fn parse_batch(input: &serde_json::Value) -> Vec<ResourceDescriptor> {
    parse_batch_entries(input)
        .into_iter()
        .filter_map(Result::ok)
        .collect()
}

/// Submit a JSON batch to `scheduler`.
///
/// The result list has one slot per array element; malformed elements resolve
/// with [`LoaderError::InvalidInput`] in place.
pub fn load_json_batch<S: Spawn>(
    scheduler: &ResourceScheduler<S>,
    input: &serde_json::Value,
) -> BatchHandle {
    scheduler.load_batch_entries(parse_batch_entries(input))
}

/// Stats plus active configuration, for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Live counters.
    pub stats: LoaderStats,
    /// Active configuration.
    pub config: LoaderConfig,
}

impl StatsResponse {
    /// Capture the current state of `scheduler`.
    pub fn capture<S: Spawn>(scheduler: &ResourceScheduler<S>) -> Self {
        Self {
            stats: scheduler.stats(),
            config: scheduler.config(),
        }
    }
}
