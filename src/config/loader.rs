//! Loader configuration: defaults, validation, JSON and environment sources.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Prefix for environment variables read by [`LoaderConfig::from_env`].
pub const ENV_PREFIX: &str = "RESOURCE_LOADER_";

const fn default_cache_enabled() -> bool {
    true
}

const fn default_timeout_ms() -> u64 {
    15_000
}

const fn default_max_concurrent() -> usize {
    6
}

const fn default_max_attempts() -> u32 {
    2
}

const fn default_retry_delay_ms() -> u64 {
    250
}

const fn default_max_retry_delay_ms() -> u64 {
    5_000
}

/// Scheduler-wide options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Store successful loads and serve repeat requests from memory.
    #[serde(default = "default_cache_enabled", alias = "cacheEnabled")]
    pub cache_enabled: bool,
    /// Default per-resource deadline in milliseconds.
    #[serde(default = "default_timeout_ms", alias = "timeoutMs")]
    pub timeout_ms: u64,
    /// Maximum simultaneously in-flight loads.
    #[serde(default = "default_max_concurrent", alias = "maxConcurrent")]
    pub max_concurrent: usize,
    /// Retries allowed after the first attempt.
    #[serde(default = "default_max_attempts", alias = "maxAttempts")]
    pub max_attempts: u32,
    /// Base delay before the first retry; doubled for each further retry.
    #[serde(default = "default_retry_delay_ms", alias = "retryDelayMs")]
    pub retry_delay_ms: u64,
    /// Upper bound for the backoff delay.
    #[serde(default = "default_max_retry_delay_ms", alias = "maxRetryDelayMs")]
    pub max_retry_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            timeout_ms: default_timeout_ms(),
            max_concurrent: default_max_concurrent(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

/// Partial update applied by `configure`. Unset fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigPatch {
    /// See [`LoaderConfig::cache_enabled`].
    #[serde(alias = "cacheEnabled")]
    pub cache_enabled: Option<bool>,
    /// See [`LoaderConfig::timeout_ms`].
    #[serde(alias = "timeoutMs")]
    pub timeout_ms: Option<u64>,
    /// See [`LoaderConfig::max_concurrent`].
    #[serde(alias = "maxConcurrent")]
    pub max_concurrent: Option<usize>,
    /// See [`LoaderConfig::max_attempts`].
    #[serde(alias = "maxAttempts")]
    pub max_attempts: Option<u32>,
    /// See [`LoaderConfig::retry_delay_ms`].
    #[serde(alias = "retryDelayMs")]
    pub retry_delay_ms: Option<u64>,
    /// See [`LoaderConfig::max_retry_delay_ms`].
    #[serde(alias = "maxRetryDelayMs")]
    pub max_retry_delay_ms: Option<u64>,
}

impl ConfigPatch {
    /// Parse a patch from JSON. Unknown keys are ignored.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))
    }
}

impl LoaderConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be greater than 0".into());
        }
        if self.max_concurrent == 0 {
            return Err("max_concurrent must be greater than 0".into());
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            return Err("max_retry_delay_ms must not be below retry_delay_ms".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `RESOURCE_LOADER_*` environment variables.
    ///
    /// A `.env` file is loaded first when present. Missing variables keep
    /// their defaults; malformed ones are rejected.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            name: &str,
        ) -> Result<Option<T>, String> {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key)
                .map(|raw| {
                    raw.trim()
                        .parse::<T>()
                        .map_err(|_| format!("{key} has invalid value `{raw}`"))
                })
                .transpose()
        }

        let patch = ConfigPatch {
            cache_enabled: parse(&lookup, "CACHE_ENABLED")?,
            timeout_ms: parse(&lookup, "TIMEOUT_MS")?,
            max_concurrent: parse(&lookup, "MAX_CONCURRENT")?,
            max_attempts: parse(&lookup, "MAX_ATTEMPTS")?,
            retry_delay_ms: parse(&lookup, "RETRY_DELAY_MS")?,
            max_retry_delay_ms: parse(&lookup, "MAX_RETRY_DELAY_MS")?,
        };
        let mut cfg = Self::default();
        cfg.apply(&patch)?;
        Ok(cfg)
    }

    /// Merge `patch` into this configuration.
    ///
    /// The merged result is validated first; on error `self` is unchanged.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), String> {
        let mut next = self.clone();
        if let Some(v) = patch.cache_enabled {
            next.cache_enabled = v;
        }
        if let Some(v) = patch.timeout_ms {
            next.timeout_ms = v;
        }
        if let Some(v) = patch.max_concurrent {
            next.max_concurrent = v;
        }
        if let Some(v) = patch.max_attempts {
            next.max_attempts = v;
        }
        if let Some(v) = patch.retry_delay_ms {
            next.retry_delay_ms = v;
        }
        if let Some(v) = patch.max_retry_delay_ms {
            next.max_retry_delay_ms = v;
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Default deadline as a duration.
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff before retry number `retry` (1-based).
    ///
    /// Doubles from `retry_delay_ms` and saturates at `max_retry_delay_ms`.
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(31);
        let delay = self
            .retry_delay_ms
            .saturating_mul(1_u64 << shift)
            .min(self.max_retry_delay_ms);
        Duration::from_millis(delay)
    }
}
