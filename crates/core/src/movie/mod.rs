//! Canonical movie model and title matching helpers.
//!
//! A [`CanonicalMovie`] is the merged view of one real-world movie assembled
//! from the primary, streaming and review providers.

mod title;
mod types;

pub use title::{normalize_title, strip_special_edition, titles_match, PatternError, TitlePattern};
pub use types::*;
