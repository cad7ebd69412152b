//! External movie providers.
//!
//! Three independent catalogs feed the search pipeline:
//! - a primary metadata provider (TMDB), authoritative for which movies exist
//! - a streaming-availability catalog, used for enrichment and as a fallback
//! - a review-score provider, attached after reconciliation
//!
//! Each provider is consumed through a trait so the orchestrator can be
//! driven by real HTTP clients or by the mocks in [`crate::testing`].

pub mod decode;
mod reviews;
mod streaming;
mod tmdb;
mod types;

pub use reviews::{ReviewClient, ReviewConfig};
pub use streaming::{StreamingCatalogClient, StreamingConfig};
pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when querying a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The call did not complete within its deadline.
    #[error("Request timed out")]
    Timeout,

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether the pipeline can carry on without this provider's results.
    ///
    /// Transport, timeout, status and parse failures are recoverable.
    /// Configuration failures are not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ProviderError::NotConfigured(_))
    }

    /// Map a non-success HTTP status to an error.
    ///
    /// A rejected key (401/403) is reported as an `ApiError` like any other
    /// status: it is only known at request time, so callers treat it as a
    /// failed call rather than a missing configuration.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ProviderError::RateLimitExceeded;
        }
        let message = match status.as_u16() {
            401 | 403 => "API key rejected".to_string(),
            _ => body.chars().take(200).collect(),
        };
        ProviderError::ApiError {
            status: status.as_u16(),
            message,
        }
    }
}

/// The authoritative metadata provider.
#[async_trait]
pub trait PrimaryProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Search movies by free-text term.
    async fn search(&self, term: &str) -> Result<Vec<PrimaryRecord>, ProviderError>;
}

/// The streaming-availability catalog.
#[async_trait]
pub trait StreamingProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Search titles, requesting the given optional fields.
    async fn search(
        &self,
        term: &str,
        expand: &[ExpandField],
    ) -> Result<Vec<StreamingRecord>, ProviderError>;
}

/// The review-score provider.
#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Search reviewed movies by free-text term.
    async fn search(&self, term: &str) -> Result<Vec<ReviewRecord>, ProviderError>;
}

/// Stand-in for an optional provider that has not been configured.
///
/// Always returns no results, so the pipeline runs as if the provider had
/// nothing to say.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl StreamingProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn search(
        &self,
        _term: &str,
        _expand: &[ExpandField],
    ) -> Result<Vec<StreamingRecord>, ProviderError> {
        Ok(vec![])
    }
}

#[async_trait]
impl ReviewProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn search(&self, _term: &str) -> Result<Vec<ReviewRecord>, ProviderError> {
        Ok(vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(ProviderError::Timeout.is_recoverable());
        assert!(ProviderError::RateLimitExceeded.is_recoverable());
        assert!(ProviderError::ParseError("bad json".to_string()).is_recoverable());
        assert!(ProviderError::ApiError {
            status: 503,
            message: "down".to_string()
        }
        .is_recoverable());
        assert!(!ProviderError::NotConfigured("no key".to_string()).is_recoverable());
    }

    #[test]
    fn test_rejected_key_status_is_recoverable() {
        for code in [401, 403] {
            let status = reqwest::StatusCode::from_u16(code).unwrap();
            let err = ProviderError::from_status(status, "Unauthorized");
            assert!(matches!(err, ProviderError::ApiError { status, .. } if status == code));
            assert!(err.is_recoverable());
        }
    }

    #[test]
    fn test_from_status_maps_rate_limit_and_truncates_body() {
        let err = ProviderError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, ProviderError::RateLimitExceeded));

        let body = "x".repeat(500);
        match ProviderError::from_status(reqwest::StatusCode::BAD_GATEWAY, &body) {
            ProviderError::ApiError { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), 200);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::ApiError {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");
    }

    #[tokio::test]
    async fn test_disabled_provider_returns_nothing() {
        let streaming = StreamingProvider::search(&DisabledProvider, "alien", &[]).await;
        assert!(streaming.unwrap().is_empty());

        let reviews = ReviewProvider::search(&DisabledProvider, "alien").await;
        assert!(reviews.unwrap().is_empty());
    }

    #[test]
    fn test_expand_field_names() {
        assert_eq!(ExpandField::Synopsis.as_str(), "synopsis");
        assert_eq!(ExpandField::Directors.as_str(), "directors");
        assert_eq!(ExpandField::Cast.as_str(), "cast");
    }
}
