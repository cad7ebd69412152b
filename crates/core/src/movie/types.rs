//! Canonical movie types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::{PrimaryRecord, ReviewRecord, StreamingRecord};

/// Poster image URLs in the three sizes providers commonly expose.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PosterUrls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
}

impl PosterUrls {
    /// True when no size is known.
    pub fn is_empty(&self) -> bool {
        self.small.is_none() && self.medium.is_none() && self.large.is_none()
    }
}

/// The merged, de-duplicated representation of a movie.
///
/// Drafts are produced by the reconciler, enriched with streaming and review
/// data, then persisted through a [`crate::store::MovieStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CanonicalMovie {
    /// Store key, assigned on first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Primary provider ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_id: Option<u32>,
    /// Streaming provider ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_id: Option<u64>,
    /// Review provider ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    /// IMDB ID (e.g. "tt1375666"), the cross-provider key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub posters: PosterUrls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
    /// Whether the streaming listing is a special edition.
    #[serde(default)]
    pub special_edition: bool,
    /// Critics score (0-100) from the review provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_url: Option<String>,
    /// When the store last wrote this movie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CanonicalMovie {
    /// Start a new draft from a primary provider record.
    pub fn from_primary(record: &PrimaryRecord) -> Self {
        let mut movie = Self::default();
        movie.apply_primary(record);
        movie
    }

    /// Overwrite descriptive fields with the primary provider's view.
    ///
    /// Optional fields the record lacks keep their previous value so that a
    /// sparse search result never erases data persisted by an earlier search.
    pub fn apply_primary(&mut self, record: &PrimaryRecord) {
        self.primary_id = Some(record.id);
        self.title = record.title.clone();
        if record.imdb_id.as_deref().is_some_and(|id| !id.is_empty()) {
            self.imdb_id = record.imdb_id.clone();
        }
        if record.year.is_some() {
            self.year = record.year;
        }
        if record.runtime_minutes.is_some() {
            self.runtime_minutes = record.runtime_minutes;
        }
        if !record.posters.is_empty() {
            self.posters = record.posters.clone();
        }
        if record.synopsis.is_some() {
            self.synopsis = record.synopsis.clone();
        }
        if !record.cast.is_empty() {
            self.cast = record.cast.clone();
        }
        if !record.directors.is_empty() {
            self.directors = record.directors.clone();
        }
        if record.homepage.is_some() {
            self.homepage = record.homepage.clone();
        }
    }

    /// Link a streaming listing, filling gaps the primary provider left.
    pub fn apply_streaming(&mut self, record: &StreamingRecord) {
        self.streaming_id = Some(record.id);
        self.special_edition = record.special_edition;
        if record.url.is_some() {
            self.streaming_url = record.url.clone();
        }
        if self.title.is_empty() {
            self.title = record.title.clone();
        }
        if self.year.is_none() {
            self.year = record.year;
        }
        if self.runtime_minutes.is_none() {
            self.runtime_minutes = record.runtime_minutes;
        }
        if self.synopsis.is_none() {
            self.synopsis = record.synopsis.clone();
        }
        if self.cast.is_empty() {
            self.cast = record.cast.clone();
        }
        if self.directors.is_empty() {
            self.directors = record.directors.clone();
        }
        if self.posters.is_empty() {
            self.posters = record.posters.clone();
        }
        if self.homepage.is_none() {
            self.homepage = record.official_url.clone();
        }
    }

    /// Attach a review record's score and links.
    pub fn apply_review(&mut self, record: &ReviewRecord) {
        self.review_id = Some(record.id.clone());
        self.review_score = record.critics_score;
        self.review_url = record.url.clone();
        if self.imdb_id.is_none() {
            self.imdb_id = record.imdb_id.clone();
        }
    }

    /// The IMDB ID if present and non-empty.
    pub fn imdb_key(&self) -> Option<&str> {
        self.imdb_id.as_deref().filter(|id| !id.is_empty())
    }

    /// "Title (Year)", or just the title when the year is unknown.
    pub fn title_with_year(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }

    /// IMDB title page, if the IMDB ID is known.
    pub fn imdb_url(&self) -> Option<String> {
        self.imdb_key()
            .map(|id| format!("https://www.imdb.com/title/{}/", id))
    }
}
