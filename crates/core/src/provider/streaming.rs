//! Streaming catalog API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decode::decode_streaming_catalog;
use super::tmdb::default_http_timeout;
use super::{ExpandField, ProviderError, StreamingProvider, StreamingRecord};

/// Streaming catalog client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Catalog API key (required).
    pub api_key: String,
    /// Catalog base URL (e.g. "https://api.streaming.example.com").
    pub base_url: String,
    /// Results requested per search (default: 5).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// HTTP timeout in seconds (default: 30).
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u32,
}

fn default_page_size() -> u32 {
    5
}

/// Streaming catalog client.
pub struct StreamingCatalogClient {
    client: Client,
    config: StreamingConfig,
}

impl StreamingCatalogClient {
    /// Create a new streaming catalog client.
    pub fn new(config: StreamingConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Streaming catalog API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self { client, config })
    }

    /// Build the catalog search URL for the first page of results.
    fn build_search_url(&self, term: &str, expand: &[ExpandField]) -> String {
        let mut url = format!(
            "{}/catalog/titles?term={}&max_results={}&start_index=0&api_key={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(term),
            self.config.page_size,
            urlencoding::encode(&self.config.api_key),
        );

        if !expand.is_empty() {
            let fields: Vec<&str> = expand.iter().map(|f| f.as_str()).collect();
            url.push_str("&expand=");
            url.push_str(&urlencoding::encode(&fields.join(",")));
        }

        url
    }
}

#[async_trait]
impl StreamingProvider for StreamingCatalogClient {
    fn name(&self) -> &str {
        "streaming"
    }

    async fn search(
        &self,
        term: &str,
        expand: &[ExpandField],
    ) -> Result<Vec<StreamingRecord>, ProviderError> {
        let url = self.build_search_url(term, expand);

        debug!(term = %term, ?expand, "Streaming catalog search");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let body = response.text().await?;
        let catalog = decode_streaming_catalog(&body)?;

        debug!(
            term = %term,
            results = catalog.titles.len(),
            total = catalog.total_entries,
            "Streaming catalog search complete"
        );

        Ok(catalog.titles)
    }
}
