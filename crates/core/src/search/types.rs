//! Types for the search pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::movie::{CanonicalMovie, PatternError};
use crate::provider::ProviderError;
use crate::store::StoreError;

/// Which stage of the fallback chain produced the results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchPath {
    /// Primary, streaming and review providers reconciled together.
    Combined,
    /// Primary provider unavailable; streaming titles linked to stored movies.
    Streaming,
    /// Every provider path failed; local title pattern search.
    Pattern,
}

impl SearchPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchPath::Combined => "combined",
            SearchPath::Streaming => "streaming",
            SearchPath::Pattern => "pattern",
        }
    }
}

/// Result of one search, with diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The term that was searched.
    pub term: String,
    /// Stage that produced `movies`.
    pub path: SearchPath,
    /// Canonical movies, in result order.
    pub movies: Vec<CanonicalMovie>,
    /// Movies that could not be persisted (still returned).
    #[serde(default)]
    pub persist_failures: u32,
    /// How long the search took in milliseconds.
    pub duration_ms: u64,
}

/// Errors surfaced to callers of a search.
///
/// Provider failures never reach the caller; only a store that cannot serve
/// the final pattern search does.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Movie store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
}

/// Why a provider-backed stage gave up and handed over to the next one.
#[derive(Debug, Error)]
pub(crate) enum StageFailure {
    #[error("primary provider failed: {0}")]
    Primary(ProviderError),

    #[error("primary provider returned no usable results")]
    NoPrimaryResults,

    #[error("optional provider failed: {0}")]
    Optional(ProviderError),

    #[error("store lookup failed: {0}")]
    Store(#[from] StoreError),
}
