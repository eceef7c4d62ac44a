//! HTTP byte source backed by reqwest.

use anyhow::Context;
use async_trait::async_trait;

use super::ResourceSource;
use crate::core::AppResult;

/// Fetches locators over HTTP(S), optionally relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpSource {
    /// Source using absolute locators.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    /// Prefix relative locators with `base_url`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn url_for(&self, locator: &str) -> String {
        match &self.base_url {
            Some(base) if !locator.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                locator.trim_start_matches('/')
            ),
            _ => locator.to_string(),
        }
    }
}

#[async_trait]
impl ResourceSource for HttpSource {
    async fn read(&self, locator: &str) -> AppResult<Vec<u8>> {
        let url = self.url_for(locator);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("requesting {url}"))?;
        let body = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        Ok(body.to_vec())
    }
}
