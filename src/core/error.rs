//! Error types for loader operations.

use thiserror::Error;

/// Errors produced while scheduling and loading resources.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    /// The fetcher reported a failure.
    #[error("fetch failed for `{identity}`: {reason}")]
    Fetch {
        /// Identity of the resource being loaded.
        identity: String,
        /// Failure description from the fetcher or its byte source.
        reason: String,
    },
    /// The deadline elapsed before the fetch resolved.
    #[error("timed out after {timeout_ms} ms loading `{identity}`")]
    Timeout {
        /// Identity of the resource being loaded.
        identity: String,
        /// Deadline that was exceeded, in milliseconds.
        timeout_ms: u64,
    },
    /// No fetcher is registered for the requested kind.
    #[error("no fetcher registered for resource kind `{0}`")]
    UnsupportedKind(String),
    /// Input could not be interpreted as a load request.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Configuration values were rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The scheduler was shut down before the load finished.
    #[error("scheduler shut down")]
    Shutdown,
}

impl LoaderError {
    /// Build a fetch failure for `identity`.
    pub fn fetch(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            identity: identity.into(),
            reason: reason.into(),
        }
    }

    /// Whether the retry controller may re-enqueue after this error.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Timeout { .. })
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
