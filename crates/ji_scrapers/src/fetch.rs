//! Page fetching.
//!
//! Fetchers return the raw HTML body; callers parse it with
//! `scraper::Html` in synchronous code so parsed documents never live
//! across an `.await`.

use std::time::Duration;

use async_trait::async_trait;
use ji_core::{Error, Result, SiteConfig};
use tracing::debug;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and return its body. Transport errors and non-success
    /// statuses are both errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        Self::new(&config.user_agent, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("status {}", status)));
        }
        response.text().await.map_err(|e| Error::fetch(url, e))
    }
}
