use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::provider::{ExpandField, ReviewConfig, StreamingConfig, TmdbConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub providers: ProvidersConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cinematch.db")
}

/// Search pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchConfig {
    /// Deadline for each provider call in milliseconds (default: 5000).
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    /// Optional fields requested from the streaming catalog.
    #[serde(default = "default_streaming_expand")]
    pub streaming_expand: Vec<ExpandField>,
}

impl SearchConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout_ms(),
            streaming_expand: default_streaming_expand(),
        }
    }
}

fn default_provider_timeout_ms() -> u64 {
    5000
}

fn default_streaming_expand() -> Vec<ExpandField> {
    vec![ExpandField::Synopsis, ExpandField::Directors]
}

/// External provider configuration
///
/// The primary provider is required. An absent optional section disables
/// that provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub streaming: Option<StreamingConfig>,
    #[serde(default)]
    pub reviews: Option<ReviewConfig>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub providers: SanitizedProvidersConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    pub tmdb: SanitizedProviderConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<SanitizedProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<SanitizedProviderConfig>,
}

/// Provider config with the API key hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let providers = &config.providers;
        Self {
            database: config.database.clone(),
            search: config.search.clone(),
            providers: SanitizedProvidersConfig {
                tmdb: SanitizedProviderConfig {
                    base_url: providers.tmdb.base_url.clone(),
                    api_key_configured: !providers.tmdb.api_key.is_empty(),
                    timeout_secs: providers.tmdb.timeout_secs,
                },
                streaming: providers.streaming.as_ref().map(|s| SanitizedProviderConfig {
                    base_url: Some(s.base_url.clone()),
                    api_key_configured: !s.api_key.is_empty(),
                    timeout_secs: s.timeout_secs,
                }),
                reviews: providers.reviews.as_ref().map(|r| SanitizedProviderConfig {
                    base_url: r.base_url.clone(),
                    api_key_configured: !r.api_key.is_empty(),
                    timeout_secs: r.timeout_secs,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[providers.tmdb]
api_key = "tmdb-key"
"#;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.database.path.to_str().unwrap(), "cinematch.db");
        assert_eq!(config.search.provider_timeout_ms, 5000);
        assert_eq!(
            config.search.streaming_expand,
            vec![ExpandField::Synopsis, ExpandField::Directors]
        );
        assert_eq!(config.providers.tmdb.timeout_secs, 30);
        assert!(config.providers.streaming.is_none());
        assert!(config.providers.reviews.is_none());
    }

    #[test]
    fn test_deserialize_missing_primary_provider_fails() {
        let toml = r#"
[search]
provider_timeout_ms = 1000
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[database]
path = "/data/movies.sqlite"

[search]
provider_timeout_ms = 2500
streaming_expand = ["synopsis", "cast"]

[providers.tmdb]
api_key = "tmdb-key"
base_url = "http://localhost:9000/3"

[providers.streaming]
api_key = "streaming-key"
base_url = "http://localhost:9001"
page_size = 10

[providers.reviews]
api_key = "review-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database.path.to_str().unwrap(), "/data/movies.sqlite");
        assert_eq!(config.search.provider_timeout(), Duration::from_millis(2500));
        assert_eq!(
            config.search.streaming_expand,
            vec![ExpandField::Synopsis, ExpandField::Cast]
        );

        let streaming = config.providers.streaming.as_ref().unwrap();
        assert_eq!(streaming.page_size, 10);
        assert_eq!(streaming.timeout_secs, 30); // default

        let reviews = config.providers.reviews.as_ref().unwrap();
        assert_eq!(reviews.page_limit, 10);
        assert!(reviews.base_url.is_none());
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let config: Config = toml::from_str(
            r#"
[providers.tmdb]
api_key = "secret"

[providers.streaming]
api_key = ""
base_url = "http://localhost:9001"
"#,
        )
        .unwrap();

        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.providers.tmdb.api_key_configured);
        let streaming = sanitized.providers.streaming.as_ref().unwrap();
        assert!(!streaming.api_key_configured);
        assert!(sanitized.providers.reviews.is_none());

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret"));
    }
}
