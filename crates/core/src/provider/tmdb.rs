//! TMDB (The Movie Database) API client, the primary metadata provider.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decode::decode_tmdb_search;
use super::{PrimaryProvider, PrimaryRecord, ProviderError};

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    /// HTTP timeout in seconds (default: 30).
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u32,
}

pub(crate) fn default_http_timeout() -> u32 {
    30
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| "https://image.tmdb.org/t/p".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            image_base_url,
        })
    }
}

#[async_trait]
impl PrimaryProvider for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    async fn search(&self, term: &str) -> Result<Vec<PrimaryRecord>, ProviderError> {
        let url = format!("{}/search/movie", self.base_url.trim_end_matches('/'));

        debug!(term = %term, "TMDB movie search");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("query", term)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let body = response.text().await?;
        decode_tmdb_search(&body, &self.image_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key() {
        let result = TmdbClient::new(TmdbConfig {
            api_key: String::new(),
            base_url: None,
            image_base_url: None,
            timeout_secs: 30,
        });
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_new_applies_defaults() {
        let client = TmdbClient::new(TmdbConfig {
            api_key: "key".to_string(),
            base_url: None,
            image_base_url: None,
            timeout_secs: 30,
        })
        .unwrap();
        assert_eq!(client.base_url, "https://api.themoviedb.org/3");
        assert_eq!(client.image_base_url, "https://image.tmdb.org/t/p");
        assert_eq!(client.name(), "tmdb");
    }
}
