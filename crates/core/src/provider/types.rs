//! Typed records as seen by each external provider.

use serde::{Deserialize, Serialize};

use crate::movie::{titles_match, PosterUrls};

/// A movie from the primary metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrimaryRecord {
    /// Primary provider ID.
    pub id: u32,
    /// IMDB ID, when the provider exposes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub title: String,
    /// Release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default)]
    pub posters: PosterUrls,
    /// Runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    /// Official website.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl PrimaryRecord {
    /// Whether a streaming listing describes the same movie.
    pub fn matches_streaming(&self, other: &StreamingRecord) -> bool {
        titles_match(&self.title, self.year, &other.title, other.year)
    }
}

/// A title from the streaming-availability provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamingRecord {
    /// Streaming catalog ID.
    pub id: u64,
    /// Title with any "special edition" suffix already removed.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// Runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub posters: PosterUrls,
    /// Whether the listing was titled as a special edition.
    #[serde(default)]
    pub special_edition: bool,
    /// Catalog web page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Official website linked from the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_url: Option<String>,
}

/// A movie from the review-score provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    /// Review provider ID.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    /// IMDB ID in "tt" form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    /// Critics score (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critics_score: Option<u8>,
    /// Audience score (0-100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Optional fields requested from the streaming catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExpandField {
    Synopsis,
    Directors,
    Cast,
}

impl ExpandField {
    /// Name used in the catalog's `expand` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpandField::Synopsis => "synopsis",
            ExpandField::Directors => "directors",
            ExpandField::Cast => "cast",
        }
    }
}

/// One page of streaming catalog results.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingCatalog {
    pub titles: Vec<StreamingRecord>,
    pub total_entries: u32,
    pub per_page: u32,
    pub offset: u32,
}
