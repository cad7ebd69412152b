//! Movie store - persisted canonical movies.
//!
//! The store is the only state that outlives a search: reconciled drafts are
//! written here, later searches update them in place, and the pattern
//! fallback searches it when every provider is down.

mod sqlite;

pub use sqlite::SqliteMovieStore;

use std::collections::HashMap;

use thiserror::Error;

use crate::movie::{CanonicalMovie, TitlePattern};

/// Errors for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Trait for canonical movie storage.
pub trait MovieStore: Send + Sync {
    /// Look up persisted movies by primary provider ID.
    ///
    /// IDs with no stored movie are absent from the returned map.
    fn find_by_primary_ids(&self, ids: &[u32]) -> Result<HashMap<u32, CanonicalMovie>, StoreError>;

    /// Look up persisted movies by streaming catalog ID.
    fn find_by_streaming_ids(
        &self,
        ids: &[u64],
    ) -> Result<HashMap<u64, CanonicalMovie>, StoreError>;

    /// Find movies whose title matches the pattern, ordered by title.
    fn find_by_title_pattern(
        &self,
        pattern: &TitlePattern,
    ) -> Result<Vec<CanonicalMovie>, StoreError>;

    /// Create or update a movie, returning its store ID.
    ///
    /// An existing row is located by store ID, then primary ID, then IMDB ID,
    /// then title and year.
    fn save(&self, movie: &CanonicalMovie) -> Result<String, StoreError>;
}
