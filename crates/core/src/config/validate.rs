use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Providers section exists with a primary provider (enforced by serde)
/// - Provider timeout is not 0
/// - Configured providers have a non-empty API key
/// - Page sizes are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search.provider_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "search.provider_timeout_ms cannot be 0".to_string(),
        ));
    }

    let providers = &config.providers;
    if providers.tmdb.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "providers.tmdb.api_key cannot be empty".to_string(),
        ));
    }

    if let Some(streaming) = &providers.streaming {
        if streaming.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "providers.streaming.api_key cannot be empty".to_string(),
            ));
        }
        if streaming.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "providers.streaming.page_size cannot be 0".to_string(),
            ));
        }
    }

    if let Some(reviews) = &providers.reviews {
        if reviews.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "providers.reviews.api_key cannot be empty".to_string(),
            ));
        }
        if reviews.page_limit == 0 {
            return Err(ConfigError::ValidationError(
                "providers.reviews.page_limit cannot be 0".to_string(),
            ));
        }
    }

    Ok(())
}
