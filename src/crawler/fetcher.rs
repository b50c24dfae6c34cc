//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the HTTP client from configuration
//! - Fetching the raw manifest bytes
//! - Fetching results pages into a [`Page`] handle
//!
//! Fetching sits behind the [`DocumentFetcher`] trait so the pool can be
//! driven by anything that can produce pages, not only live HTTP.

use crate::config::{HttpConfig, ID_PLACEHOLDER};
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use scraper::Html;
use std::time::Duration;

/// A fetched results page
///
/// Holds the raw markup only. Parsing into a DOM is done on demand by
/// [`Page::document`], which keeps the handle `Send` so it can cross task
/// boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    locator: String,
    markup: String,
}

impl Page {
    pub fn new(locator: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            markup: markup.into(),
        }
    }

    /// The locator the page was fetched from
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Parses the markup into a queryable document
    pub fn document(&self) -> Html {
        Html::parse_document(&self.markup)
    }
}

/// Source of manifests and results pages
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetches the raw bytes of the area manifest
    async fn fetch_manifest(&self, locator: &str) -> Result<Vec<u8>, HarvestError>;

    /// Fetches one results page
    async fn fetch_page(&self, locator: &str) -> Result<Page, HarvestError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fills the area identifier into a page template
///
/// # Example
///
/// ```
/// use tally_harvest::crawler::expand_locator;
///
/// let url = expand_locator("https://example.com/n{id}.html", "00123");
/// assert_eq!(url, "https://example.com/n00123.html");
/// ```
pub fn expand_locator(template: &str, id: &str) -> String {
    template.replacen(ID_PLACEHOLDER, id, 1)
}

/// [`DocumentFetcher`] backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the HTTP configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, HarvestError> {
        Ok(Self::new(build_http_client(config)?))
    }

    /// Sends a GET and rejects any non-success status
    async fn get(&self, locator: &str) -> Result<Response, HarvestError> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|source| HarvestError::Http {
                url: locator.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: locator.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_manifest(&self, locator: &str) -> Result<Vec<u8>, HarvestError> {
        let response = self.get(locator).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| HarvestError::Http {
                url: locator.to_string(),
                source,
            })?;
        tracing::debug!("Fetched manifest {} ({} bytes)", locator, bytes.len());
        Ok(bytes.to_vec())
    }

    async fn fetch_page(&self, locator: &str) -> Result<Page, HarvestError> {
        let response = self.get(locator).await?;
        let markup = response
            .text()
            .await
            .map_err(|source| HarvestError::Http {
                url: locator.to_string(),
                source,
            })?;
        Ok(Page::new(locator, markup))
    }
}
