//! Testing utilities and mock implementations.
//!
//! Mock providers and an in-memory store let the whole search pipeline run
//! without network access or a database file.
//!
//! # Example
//!
//! ```rust,ignore
//! use cinematch_core::testing::{fixtures, MemoryMovieStore, MockPrimaryProvider};
//!
//! let primary = Arc::new(MockPrimaryProvider::new());
//! primary.set_results(vec![fixtures::primary_record(603, "The Matrix", 1999)]).await;
//!
//! let orchestrator = SearchOrchestrator::new(config, primary, Arc::new(MemoryMovieStore::new()));
//! ```

mod memory_store;
mod mock_providers;

pub use memory_store::MemoryMovieStore;
pub use mock_providers::{
    MockPrimaryProvider, MockReviewProvider, MockStreamingProvider, RecordedQuery,
};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::movie::PosterUrls;
    use crate::provider::{PrimaryRecord, ReviewRecord, StreamingRecord};

    /// Create a primary record with only the identifying fields set.
    pub fn primary_record(id: u32, title: &str, year: u16) -> PrimaryRecord {
        PrimaryRecord {
            id,
            imdb_id: None,
            title: title.to_string(),
            year: Some(year),
            posters: PosterUrls::default(),
            runtime_minutes: None,
            synopsis: None,
            cast: vec![],
            directors: vec![],
            homepage: None,
        }
    }

    /// Create a streaming catalog title.
    pub fn streaming_record(id: u64, title: &str, year: Option<u16>) -> StreamingRecord {
        StreamingRecord {
            id,
            title: title.to_string(),
            year,
            runtime_minutes: None,
            synopsis: None,
            cast: vec![],
            directors: vec![],
            posters: PosterUrls::default(),
            special_edition: false,
            url: None,
            official_url: None,
        }
    }

    /// Create a review record with a critics score of 87.
    pub fn review_record(id: &str, title: &str, year: Option<u16>) -> ReviewRecord {
        ReviewRecord {
            id: id.to_string(),
            title: title.to_string(),
            year,
            imdb_id: None,
            critics_score: Some(87),
            audience_score: None,
            url: None,
        }
    }
}
