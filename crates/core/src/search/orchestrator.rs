//! Search orchestrator - drives providers, reconciliation and persistence.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{self, Either};
use tracing::{debug, info, warn};

use super::types::{SearchError, SearchOutcome, SearchPath, StageFailure};
use crate::config::SearchConfig;
use crate::metrics;
use crate::movie::{CanonicalMovie, TitlePattern};
use crate::provider::{
    DisabledProvider, PrimaryProvider, ProviderError, ReviewProvider, StreamingProvider,
};
use crate::reconcile::{attach_reviews, reconcile};
use crate::store::MovieStore;

/// Drives one search through the fallback chain.
///
/// Holds only shared handles, so a single orchestrator can serve concurrent
/// searches; each call owns its own working set.
pub struct SearchOrchestrator {
    config: SearchConfig,
    primary: Arc<dyn PrimaryProvider>,
    streaming: Arc<dyn StreamingProvider>,
    reviews: Arc<dyn ReviewProvider>,
    store: Arc<dyn MovieStore>,
}

impl SearchOrchestrator {
    /// Create an orchestrator with the primary provider and store.
    ///
    /// Streaming and review providers start disabled; set them with the
    /// `with_*` methods.
    pub fn new(
        config: SearchConfig,
        primary: Arc<dyn PrimaryProvider>,
        store: Arc<dyn MovieStore>,
    ) -> Self {
        Self {
            config,
            primary,
            streaming: Arc::new(DisabledProvider),
            reviews: Arc::new(DisabledProvider),
            store,
        }
    }

    /// Set the streaming catalog provider.
    pub fn with_streaming(mut self, streaming: Arc<dyn StreamingProvider>) -> Self {
        self.streaming = streaming;
        self
    }

    /// Set the review provider.
    pub fn with_reviews(mut self, reviews: Arc<dyn ReviewProvider>) -> Self {
        self.reviews = reviews;
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search movies by term, returning canonical movies.
    ///
    /// Provider outages degrade the result instead of failing the call. The
    /// only error is a store that cannot serve the final pattern search.
    pub async fn search(&self, term: &str) -> Result<Vec<CanonicalMovie>, SearchError> {
        Ok(self.search_with_outcome(term).await?.movies)
    }

    /// Like [`search`](Self::search), also reporting which path answered.
    pub async fn search_with_outcome(&self, term: &str) -> Result<SearchOutcome, SearchError> {
        let start = Instant::now();

        let (path, movies, persist_failures) = match self.search_combined(term).await {
            Ok((movies, failures)) => (SearchPath::Combined, movies, failures),
            Err(failure) => {
                warn!(term = %term, reason = %failure, "Combined search failed, trying streaming catalog");
                match self.search_streaming(term).await {
                    Ok((movies, failures)) if !movies.is_empty() => {
                        (SearchPath::Streaming, movies, failures)
                    }
                    Ok(_) => {
                        info!(term = %term, "Streaming catalog found no stored movies, using title search");
                        (SearchPath::Pattern, self.search_pattern(term, true)?, 0)
                    }
                    Err(failure) => {
                        warn!(term = %term, reason = %failure, "Streaming search failed, using title search");
                        (SearchPath::Pattern, self.search_pattern(term, true)?, 0)
                    }
                }
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        metrics::SEARCHES_TOTAL
            .with_label_values(&[path.as_str()])
            .inc();
        metrics::SEARCH_RESULTS
            .with_label_values(&[path.as_str()])
            .observe(movies.len() as f64);

        info!(
            term = %term,
            path = path.as_str(),
            results = movies.len(),
            persist_failures,
            duration_ms,
            "Search complete"
        );

        Ok(SearchOutcome {
            term: term.to_string(),
            path,
            movies,
            persist_failures,
            duration_ms,
        })
    }

    /// Search stored movies whose title contains `term` as a whole word.
    ///
    /// With `escape = false` the term is used as a raw regular expression.
    pub fn search_pattern(
        &self,
        term: &str,
        escape: bool,
    ) -> Result<Vec<CanonicalMovie>, SearchError> {
        let pattern = if escape {
            TitlePattern::whole_word(term)?
        } else {
            TitlePattern::raw(term)?
        };
        Ok(self.store.find_by_title_pattern(&pattern)?)
    }

    /// Primary, streaming and review providers queried concurrently, then
    /// reconciled and persisted.
    ///
    /// The optional calls race the primary one. If the primary call fails
    /// first, they are dropped while still in flight.
    async fn search_combined(
        &self,
        term: &str,
    ) -> Result<(Vec<CanonicalMovie>, u32), StageFailure> {
        let expand = &self.config.streaming_expand;

        let primary = async {
            let records: Vec<_> = self
                .timed(self.primary.name(), self.primary.search(term))
                .await
                .map_err(StageFailure::Primary)?
                .into_iter()
                .filter(|record| record.year.is_some())
                .collect();
            if records.is_empty() {
                return Err(StageFailure::NoPrimaryResults);
            }
            Ok::<_, StageFailure>(records)
        };
        let optional = future::join(
            self.degraded(term, self.streaming.name(), self.streaming.search(term, expand)),
            self.degraded(term, self.reviews.name(), self.reviews.search(term)),
        );
        futures::pin_mut!(primary, optional);

        let (primary, (streaming, reviews)) = match future::select(primary, optional).await {
            Either::Left((Ok(records), optional)) => (records, optional.await),
            Either::Left((Err(failure), _)) => return Err(failure),
            Either::Right((results, primary)) => (primary.await?, results),
        };
        let streaming = streaming.map_err(StageFailure::Optional)?;
        let reviews = reviews.map_err(StageFailure::Optional)?;

        let ids: Vec<u32> = primary.iter().map(|record| record.id).collect();
        let existing = self.store.find_by_primary_ids(&ids)?;

        let mut drafts = reconcile(primary, &streaming, existing);
        let unmatched = attach_reviews(&mut drafts, reviews);
        if !unmatched.is_empty() {
            debug!(term = %term, unmatched = unmatched.len(), "Dropping unmatched reviews");
        }

        let failures = self.persist(term, &mut drafts);
        Ok((drafts, failures))
    }

    /// Streaming titles linked to stored movies by streaming ID.
    async fn search_streaming(
        &self,
        term: &str,
    ) -> Result<(Vec<CanonicalMovie>, u32), StageFailure> {
        let titles = self
            .degraded(
                term,
                self.streaming.name(),
                self.streaming.search(term, &self.config.streaming_expand),
            )
            .await
            .map_err(StageFailure::Optional)?;

        if titles.is_empty() {
            return Ok((vec![], 0));
        }

        let ids: Vec<u64> = titles.iter().map(|title| title.id).collect();
        let mut existing = self.store.find_by_streaming_ids(&ids)?;

        let mut movies: Vec<CanonicalMovie> = titles
            .iter()
            .filter_map(|title| {
                existing.remove(&title.id).map(|mut movie| {
                    movie.apply_streaming(title);
                    movie
                })
            })
            .collect();

        let failures = self.persist(term, &mut movies);
        Ok((movies, failures))
    }

    /// Save each movie independently; failures are logged and counted.
    fn persist(&self, term: &str, movies: &mut [CanonicalMovie]) -> u32 {
        let mut failures = 0;
        for movie in movies.iter_mut() {
            match self.store.save(movie) {
                Ok(id) => movie.id = Some(id),
                Err(e) => {
                    failures += 1;
                    metrics::PERSIST_FAILURES.inc();
                    warn!(
                        term = %term,
                        title = %movie.title,
                        primary_id = ?movie.primary_id,
                        error = %e,
                        "Failed to persist movie"
                    );
                }
            }
        }
        failures
    }

    /// Run a provider call under the per-call timeout, recording metrics.
    async fn timed<T, F>(&self, provider: &str, call: F) -> Result<Vec<T>, ProviderError>
    where
        F: Future<Output = Result<Vec<T>, ProviderError>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.config.provider_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };

        let status = match &result {
            Ok(_) => "success",
            Err(ProviderError::Timeout) => "timeout",
            Err(_) => "error",
        };
        metrics::PROVIDER_REQUESTS
            .with_label_values(&[provider, status])
            .inc();
        metrics::PROVIDER_DURATION
            .with_label_values(&[provider])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    /// Optional provider call: recoverable failures become an empty result.
    async fn degraded<T, F>(
        &self,
        term: &str,
        provider: &str,
        call: F,
    ) -> Result<Vec<T>, ProviderError>
    where
        F: Future<Output = Result<Vec<T>, ProviderError>>,
    {
        match self.timed(provider, call).await {
            Ok(records) => Ok(records),
            Err(e) if e.is_recoverable() => {
                warn!(
                    term = %term,
                    provider = provider,
                    error = %e,
                    "Optional provider failed, continuing without it"
                );
                Ok(vec![])
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use crate::testing::{
        fixtures, MemoryMovieStore, MockPrimaryProvider, MockReviewProvider, MockStreamingProvider,
    };
    use std::time::Duration;

    fn config() -> SearchConfig {
        SearchConfig {
            provider_timeout_ms: 100,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_combined_drops_records_without_year() {
        let primary = Arc::new(MockPrimaryProvider::new());
        let mut undated = fixtures::primary_record(2, "Heat", 1995);
        undated.year = None;
        primary
            .set_results(vec![fixtures::primary_record(1, "Heat", 1995), undated])
            .await;
        let store = Arc::new(MemoryMovieStore::new());

        let orchestrator = SearchOrchestrator::new(config(), primary, store);
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Combined);
        assert_eq!(outcome.movies.len(), 1);
        assert_eq!(outcome.movies[0].primary_id, Some(1));
        assert!(outcome.movies[0].id.is_some());
    }

    #[tokio::test]
    async fn test_empty_primary_falls_back() {
        let primary = Arc::new(MockPrimaryProvider::new());
        let store = Arc::new(MemoryMovieStore::new());
        store.insert(CanonicalMovie::from_primary(&fixtures::primary_record(
            1, "Heat", 1995,
        )));

        let orchestrator = SearchOrchestrator::new(config(), primary, store);
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Pattern);
        assert_eq!(outcome.movies.len(), 1);
    }

    #[tokio::test]
    async fn test_streaming_timeout_degrades_to_primary_only() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![fixtures::primary_record(27205, "Inception", 2010)])
            .await;
        let streaming = Arc::new(MockStreamingProvider::new());
        streaming
            .set_results(vec![fixtures::streaming_record(
                70131314,
                "Inception",
                Some(2010),
            )])
            .await;
        streaming.set_delay(Duration::from_millis(500)).await;

        let orchestrator =
            SearchOrchestrator::new(config(), primary, Arc::new(MemoryMovieStore::new()))
                .with_streaming(streaming);
        let outcome = orchestrator.search_with_outcome("inception").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Combined);
        assert_eq!(outcome.movies.len(), 1);
        assert!(outcome.movies[0].streaming_id.is_none());
    }

    #[tokio::test]
    async fn test_non_recoverable_optional_error_aborts_combined_path() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![fixtures::primary_record(1, "Heat", 1995)])
            .await;
        let streaming = Arc::new(MockStreamingProvider::new());
        streaming
            .fail_always_with(|| ProviderError::NotConfigured("no key".to_string()))
            .await;

        let orchestrator =
            SearchOrchestrator::new(config(), primary, Arc::new(MemoryMovieStore::new()))
                .with_streaming(streaming);
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Pattern);
        assert!(outcome.movies.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_key_on_optional_provider_keeps_combined_path() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![fixtures::primary_record(1, "Heat", 1995)])
            .await;
        let streaming = Arc::new(MockStreamingProvider::new());
        streaming
            .fail_always_with(|| ProviderError::ApiError {
                status: 401,
                message: "API key rejected".to_string(),
            })
            .await;
        let reviews = Arc::new(MockReviewProvider::new());
        reviews
            .fail_always_with(|| ProviderError::ApiError {
                status: 403,
                message: "API key rejected".to_string(),
            })
            .await;

        let orchestrator =
            SearchOrchestrator::new(config(), primary, Arc::new(MemoryMovieStore::new()))
                .with_streaming(streaming)
                .with_reviews(reviews);
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Combined);
        assert_eq!(outcome.movies.len(), 1);
        assert_eq!(outcome.movies[0].primary_id, Some(1));
    }

    #[tokio::test]
    async fn test_primary_failure_does_not_wait_for_slow_optional_providers() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .fail_always_with(|| ProviderError::ApiError {
                status: 500,
                message: "boom".to_string(),
            })
            .await;
        let reviews = Arc::new(MockReviewProvider::new());
        reviews.set_delay(Duration::from_secs(2)).await;

        let config = SearchConfig {
            provider_timeout_ms: 5000,
            ..Default::default()
        };
        let orchestrator =
            SearchOrchestrator::new(config, primary, Arc::new(MemoryMovieStore::new()))
                .with_reviews(reviews);

        let start = std::time::Instant::now();
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Pattern);
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_as_store_unavailable() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![fixtures::primary_record(1, "Heat", 1995)])
            .await;
        let store = Arc::new(MemoryMovieStore::new());
        store.set_unavailable(true);

        let orchestrator = SearchOrchestrator::new(config(), primary, store);
        let result = orchestrator.search("heat").await;

        assert!(matches!(
            result,
            Err(SearchError::StoreUnavailable(StoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_primary_lookup_failure_falls_through_to_streaming() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![fixtures::primary_record(949, "Heat", 1995)])
            .await;
        let streaming = Arc::new(MockStreamingProvider::new());
        streaming
            .set_results(vec![fixtures::streaming_record(60034572, "Heat", Some(1995))])
            .await;
        let store = Arc::new(MemoryMovieStore::new());
        let mut stored =
            CanonicalMovie::from_primary(&fixtures::primary_record(949, "Heat", 1995));
        stored.streaming_id = Some(60034572);
        store.insert(stored);
        store.fail_primary_lookups(true);

        let orchestrator =
            SearchOrchestrator::new(config(), primary, store).with_streaming(streaming);
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Streaming);
        assert_eq!(outcome.movies.len(), 1);
        assert_eq!(outcome.movies[0].streaming_id, Some(60034572));
    }

    #[tokio::test]
    async fn test_primary_lookup_failure_falls_through_to_pattern() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![fixtures::primary_record(949, "Heat", 1995)])
            .await;
        let store = Arc::new(MemoryMovieStore::new());
        store.insert(CanonicalMovie::from_primary(&fixtures::primary_record(
            949, "Heat", 1995,
        )));
        store.fail_primary_lookups(true);

        let orchestrator = SearchOrchestrator::new(config(), primary, store.clone());
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Pattern);
        assert_eq!(outcome.movies.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_persist_failures_do_not_abort_batch() {
        let primary = Arc::new(MockPrimaryProvider::new());
        primary
            .set_results(vec![
                fixtures::primary_record(1, "Heat", 1995),
                fixtures::primary_record(2, "Ronin", 1998),
            ])
            .await;
        let store = Arc::new(MemoryMovieStore::new());
        store.fail_saves_for_title("Heat");

        let orchestrator = SearchOrchestrator::new(config(), primary, store.clone());
        let outcome = orchestrator.search_with_outcome("heat").await.unwrap();

        assert_eq!(outcome.path, SearchPath::Combined);
        assert_eq!(outcome.movies.len(), 2);
        assert_eq!(outcome.persist_failures, 1);
        assert!(outcome.movies[0].id.is_none());
        assert!(outcome.movies[1].id.is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_search_pattern_raw() {
        let store = Arc::new(MemoryMovieStore::new());
        store.insert(CanonicalMovie::from_primary(&fixtures::primary_record(
            1, "Matrices", 2001,
        )));
        let orchestrator =
            SearchOrchestrator::new(config(), Arc::new(MockPrimaryProvider::new()), store);

        assert!(orchestrator.search_pattern("matrix", true).unwrap().is_empty());
        assert_eq!(orchestrator.search_pattern("matri\\w+", false).unwrap().len(), 1);
        assert!(matches!(
            orchestrator.search_pattern("(", false),
            Err(SearchError::InvalidPattern(_))
        ));
    }
}
