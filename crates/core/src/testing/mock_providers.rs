//! Mock providers for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::provider::{
    ExpandField, PrimaryProvider, PrimaryRecord, ProviderError, ReviewProvider, ReviewRecord,
    StreamingProvider, StreamingRecord,
};

type ErrorFactory = Arc<dyn Fn() -> ProviderError + Send + Sync>;

/// A recorded provider query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    pub term: String,
    /// Requested expand fields (streaming provider only).
    pub expand: Vec<ExpandField>,
}

/// Shared behaviour of every mock provider.
struct MockState<T> {
    results: Arc<RwLock<Vec<T>>>,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<ProviderError>>>,
    /// If set, every call fails with an error built by this factory.
    failure: Arc<RwLock<Option<ErrorFactory>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl<T: Clone> MockState<T> {
    fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failure: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    async fn call(&self, term: &str, expand: &[ExpandField]) -> Result<Vec<T>, ProviderError> {
        self.queries.write().await.push(RecordedQuery {
            term: term.to_string(),
            expand: expand.to_vec(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if let Some(make) = self.failure.read().await.as_ref() {
            return Err(make());
        }

        Ok(self.results.read().await.clone())
    }
}

macro_rules! mock_controls {
    ($mock:ident, $record:ty) => {
        impl Default for $mock {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $mock {
            /// Create a mock that returns no results.
            pub fn new() -> Self {
                Self {
                    state: MockState::new(),
                }
            }

            /// Set the results returned by every successful call.
            pub async fn set_results(&self, results: Vec<$record>) {
                *self.state.results.write().await = results;
            }

            /// Configure the next call to fail with the given error.
            pub async fn set_next_error(&self, error: ProviderError) {
                *self.state.next_error.write().await = Some(error);
            }

            /// Make every call fail with an error built by `make`.
            pub async fn fail_always_with<F>(&self, make: F)
            where
                F: Fn() -> ProviderError + Send + Sync + 'static,
            {
                let factory: ErrorFactory = Arc::new(make);
                *self.state.failure.write().await = Some(factory);
            }

            /// Clear any configured failure.
            pub async fn clear_errors(&self) {
                *self.state.next_error.write().await = None;
                *self.state.failure.write().await = None;
            }

            /// Delay every call by `delay` before answering.
            pub async fn set_delay(&self, delay: Duration) {
                *self.state.delay.write().await = Some(delay);
            }

            /// Get all recorded queries.
            pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
                self.state.queries.read().await.clone()
            }

            /// Get the number of calls made.
            pub async fn query_count(&self) -> usize {
                self.state.queries.read().await.len()
            }
        }
    };
}

/// Mock implementation of [`PrimaryProvider`].
///
/// Provides controllable behavior for testing:
/// - Return configurable results
/// - Track queries for assertions
/// - Simulate failures and slow responses
pub struct MockPrimaryProvider {
    state: MockState<PrimaryRecord>,
}

mock_controls!(MockPrimaryProvider, PrimaryRecord);

#[async_trait]
impl PrimaryProvider for MockPrimaryProvider {
    fn name(&self) -> &str {
        "mock-primary"
    }

    async fn search(&self, term: &str) -> Result<Vec<PrimaryRecord>, ProviderError> {
        self.state.call(term, &[]).await
    }
}

/// Mock implementation of [`StreamingProvider`].
pub struct MockStreamingProvider {
    state: MockState<StreamingRecord>,
}

mock_controls!(MockStreamingProvider, StreamingRecord);

#[async_trait]
impl StreamingProvider for MockStreamingProvider {
    fn name(&self) -> &str {
        "mock-streaming"
    }

    async fn search(
        &self,
        term: &str,
        expand: &[ExpandField],
    ) -> Result<Vec<StreamingRecord>, ProviderError> {
        self.state.call(term, expand).await
    }
}

/// Mock implementation of [`ReviewProvider`].
pub struct MockReviewProvider {
    state: MockState<ReviewRecord>,
}

mock_controls!(MockReviewProvider, ReviewRecord);

#[async_trait]
impl ReviewProvider for MockReviewProvider {
    fn name(&self) -> &str {
        "mock-reviews"
    }

    async fn search(&self, term: &str) -> Result<Vec<ReviewRecord>, ProviderError> {
        self.state.call(term, &[]).await
    }
}
