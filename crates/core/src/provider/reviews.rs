//! Review-score provider API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decode::decode_review_search;
use super::tmdb::default_http_timeout;
use super::{ProviderError, ReviewProvider, ReviewRecord};

/// Review provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Review API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.rottentomatoes.com/api/public/v1.0).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Results requested per search (default: 10).
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// HTTP timeout in seconds (default: 30).
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u32,
}

fn default_page_limit() -> u32 {
    10
}

/// Review provider client.
pub struct ReviewClient {
    client: Client,
    base_url: String,
    api_key: String,
    page_limit: u32,
}

impl ReviewClient {
    /// Create a new review client.
    pub fn new(config: ReviewConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Review API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.rottentomatoes.com/api/public/v1.0".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            page_limit: config.page_limit,
        })
    }
}

#[async_trait]
impl ReviewProvider for ReviewClient {
    fn name(&self) -> &str {
        "reviews"
    }

    async fn search(&self, term: &str) -> Result<Vec<ReviewRecord>, ProviderError> {
        let url = format!("{}/movies.json", self.base_url.trim_end_matches('/'));
        let page_limit = self.page_limit.to_string();

        debug!(term = %term, "Review search");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("q", term),
                ("page_limit", page_limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let body = response.text().await?;
        decode_review_search(&body)
    }
}
