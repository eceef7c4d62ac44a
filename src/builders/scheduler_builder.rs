//! Builder assembling a scheduler from configuration, fetchers and a spawner.

use std::sync::Arc;

use crate::config::{ConfigPatch, LoaderConfig};
use crate::core::{FetcherRegistry, LoaderError, ResourceFetcher, ResourceKind, ResourceScheduler, Spawn};
use crate::infra::fetchers::default_registry;
use crate::infra::source::ResourceSource;
use crate::infra::surface::RenderSurface;
use crate::runtime::TokioSpawner;

/// Fluent construction of a [`ResourceScheduler`].
#[derive(Debug, Default)]
pub struct SchedulerBuilder {
    config: LoaderConfig,
    fetchers: FetcherRegistry,
}

impl SchedulerBuilder {
    /// Builder with default configuration and no fetchers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder starting from `RESOURCE_LOADER_*` environment variables.
    pub fn from_env() -> Result<Self, LoaderError> {
        let config = LoaderConfig::from_env().map_err(LoaderError::Config)?;
        Ok(Self {
            config,
            fetchers: FetcherRegistry::new(),
        })
    }

    /// Current configuration.
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Merge `patch` into the configuration.
    pub fn configure(mut self, patch: &ConfigPatch) -> Result<Self, LoaderError> {
        self.config.apply(patch).map_err(LoaderError::Config)?;
        Ok(self)
    }

    /// Register the built-in picture, module and stylesheet fetchers.
    ///
    /// Fetchers registered earlier for those kinds are replaced; other kinds
    /// are kept.
    #[must_use]
    pub fn with_default_fetchers<S, R>(mut self, source: Arc<S>, surface: Arc<R>) -> Self
    where
        S: ResourceSource,
        R: RenderSurface,
    {
        let defaults = default_registry(source, surface);
        for kind in [ResourceKind::Picture, ResourceKind::Module, ResourceKind::Stylesheet] {
            if let Ok(fetcher) = defaults.get(&kind) {
                self.fetchers.register_shared(kind, fetcher);
            }
        }
        self
    }

    /// Register a fetcher for `kind`.
    #[must_use]
    pub fn with_fetcher<F: ResourceFetcher>(mut self, kind: ResourceKind, fetcher: F) -> Self {
        self.fetchers.register(kind, fetcher);
        self
    }

    /// Build on the current tokio runtime.
    pub fn build(self) -> Result<ResourceScheduler<TokioSpawner>, LoaderError> {
        let spawner = TokioSpawner::try_current()?;
        self.build_with_spawner(spawner)
    }

    /// Build with an explicit spawner.
    pub fn build_with_spawner<S: Spawn>(self, spawner: S) -> Result<ResourceScheduler<S>, LoaderError> {
        ResourceScheduler::new(self.config, self.fetchers, spawner)
    }
}
