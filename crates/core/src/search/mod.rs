//! Movie search pipeline with a fallback chain.
//!
//! `SearchOrchestrator::search` tries, in order:
//! 1. the combined path (primary + streaming + review, reconciled),
//! 2. the streaming-only path (streaming titles linked to stored movies),
//! 3. a whole-word title pattern search over stored movies.

mod orchestrator;
mod types;

pub use orchestrator::SearchOrchestrator;
pub use types::{SearchError, SearchOutcome, SearchPath};
