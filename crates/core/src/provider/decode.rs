//! Pure decoders turning raw provider payloads into typed records.
//!
//! Decoders never touch the network, so they can be exercised directly with
//! captured response bodies.

use serde::{Deserialize, Deserializer};

use super::types::{PrimaryRecord, ReviewRecord, StreamingCatalog, StreamingRecord};
use super::ProviderError;
use crate::movie::{strip_special_edition, PosterUrls};

// ============================================================================
// Primary provider (TMDB)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    release_date: Option<String>,
    imdb_id: Option<String>,
    poster_path: Option<String>,
    overview: Option<String>,
    runtime: Option<u32>,
    homepage: Option<String>,
    #[serde(default)]
    cast: Vec<String>,
    #[serde(default)]
    directors: Vec<String>,
}

/// Decode a TMDB movie search response.
///
/// Poster URLs are built against `image_base_url` in three widths.
pub fn decode_tmdb_search(
    body: &str,
    image_base_url: &str,
) -> Result<Vec<PrimaryRecord>, ProviderError> {
    let response: TmdbSearchResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::ParseError(format!("Failed to parse movie search response: {}", e))
    })?;

    let base = image_base_url.trim_end_matches('/');
    Ok(response
        .results
        .into_iter()
        .map(|r| PrimaryRecord {
            id: r.id,
            imdb_id: non_empty(r.imdb_id),
            year: r.release_date.as_deref().and_then(year_from_date),
            posters: r
                .poster_path
                .filter(|p| !p.is_empty())
                .map(|path| PosterUrls {
                    small: Some(format!("{}/w92{}", base, path)),
                    medium: Some(format!("{}/w185{}", base, path)),
                    large: Some(format!("{}/w500{}", base, path)),
                })
                .unwrap_or_default(),
            title: r.title,
            runtime_minutes: r.runtime.filter(|m| *m > 0),
            synopsis: non_empty(r.overview),
            cast: r.cast,
            directors: r.directors,
            homepage: non_empty(r.homepage),
        })
        .collect())
}

/// Year from a "YYYY-MM-DD" (or partial) date.
fn year_from_date(date: &str) -> Option<u16> {
    date.split('-').next().and_then(|y| y.parse().ok())
}

// ============================================================================
// Streaming catalog
// ============================================================================

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    catalog_title: Vec<CatalogTitle>,
    number_of_results: Option<u32>,
    results_per_page: Option<u32>,
    start_index: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CatalogTitle {
    id: String,
    title: CatalogTitleName,
    #[serde(default)]
    box_art: CatalogBoxArt,
    release_year: Option<u16>,
    /// Runtime in seconds.
    runtime: Option<u32>,
    synopsis: Option<String>,
    #[serde(default)]
    directors: Vec<String>,
    #[serde(default)]
    cast: Vec<String>,
    #[serde(default)]
    links: CatalogLinks,
}

#[derive(Debug, Deserialize)]
struct CatalogTitleName {
    regular: String,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogBoxArt {
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogLinks {
    web_page: Option<String>,
    official_webpage: Option<String>,
}

/// Decode a streaming catalog search response.
///
/// Title IDs arrive as resource URLs; the numeric ID is the last run of
/// digits. Runtimes arrive in seconds.
pub fn decode_streaming_catalog(body: &str) -> Result<StreamingCatalog, ProviderError> {
    let response: CatalogResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::ParseError(format!("Failed to parse catalog response: {}", e))
    })?;

    let titles = response
        .catalog_title
        .into_iter()
        .map(|t| {
            let id = id_from_url(&t.id).ok_or_else(|| {
                ProviderError::ParseError(format!("Catalog title without numeric id: {}", t.id))
            })?;
            let (title, special_edition) = strip_special_edition(&t.title.regular);
            Ok(StreamingRecord {
                id,
                title,
                year: t.release_year.filter(|y| *y > 0),
                runtime_minutes: t.runtime.map(|secs| secs / 60).filter(|m| *m > 0),
                synopsis: non_empty(t.synopsis),
                cast: t.cast,
                directors: t.directors,
                posters: PosterUrls {
                    small: t.box_art.small,
                    medium: t.box_art.medium,
                    large: t.box_art.large,
                },
                special_edition,
                url: t.links.web_page,
                official_url: t.links.official_webpage,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Ok(StreamingCatalog {
        total_entries: response.number_of_results.unwrap_or(titles.len() as u32),
        per_page: response.results_per_page.unwrap_or(titles.len() as u32),
        offset: response.start_index.unwrap_or(0),
        titles,
    })
}

/// Numeric ID from a resource URL such as ".../catalog/titles/movies/60031236".
fn id_from_url(url: &str) -> Option<u64> {
    url.split(|c: char| !c.is_ascii_digit())
        .filter(|part| !part.is_empty())
        .last()
        .and_then(|digits| digits.parse().ok())
}

// ============================================================================
// Review provider
// ============================================================================

#[derive(Debug, Deserialize)]
struct ReviewSearchResponse {
    #[serde(default)]
    movies: Vec<ReviewMovie>,
}

#[derive(Debug, Deserialize)]
struct ReviewMovie {
    id: String,
    title: String,
    #[serde(default, deserialize_with = "lenient_year")]
    year: Option<u16>,
    #[serde(default)]
    ratings: ReviewRatings,
    #[serde(default)]
    alternate_ids: ReviewAlternateIds,
    #[serde(default)]
    links: ReviewLinks,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewRatings {
    critics_score: Option<i32>,
    audience_score: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewAlternateIds {
    imdb: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReviewLinks {
    alternate: Option<String>,
}

/// The review API reports unknown years as "" and unknown scores as -1.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Number(u16),
        Text(String),
    }

    Ok(match Option::<Year>::deserialize(deserializer)? {
        Some(Year::Number(y)) if y > 0 => Some(y),
        Some(Year::Text(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn score(raw: Option<i32>) -> Option<u8> {
    raw.filter(|s| (0..=100).contains(s)).map(|s| s as u8)
}

/// Decode a review provider search response.
pub fn decode_review_search(body: &str) -> Result<Vec<ReviewRecord>, ProviderError> {
    let response: ReviewSearchResponse = serde_json::from_str(body).map_err(|e| {
        ProviderError::ParseError(format!("Failed to parse review search response: {}", e))
    })?;

    Ok(response
        .movies
        .into_iter()
        .map(|m| ReviewRecord {
            id: m.id,
            title: m.title,
            year: m.year,
            imdb_id: non_empty(m.alternate_ids.imdb).map(|id| {
                if id.starts_with("tt") {
                    id
                } else {
                    format!("tt{}", id)
                }
            }),
            critics_score: score(m.ratings.critics_score),
            audience_score: score(m.ratings.audience_score),
            url: m.links.alternate,
        })
        .collect())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";

    #[test]
    fn test_decode_tmdb_search() {
        let body = r#"{
            "page": 1,
            "results": [
                {
                    "id": 603,
                    "title": "The Matrix",
                    "release_date": "1999-03-30",
                    "imdb_id": "tt0133093",
                    "poster_path": "/matrix.jpg",
                    "overview": "A computer hacker learns the truth.",
                    "vote_average": 8.2
                },
                {
                    "id": 604,
                    "title": "The Matrix Reloaded",
                    "release_date": "",
                    "overview": ""
                }
            ]
        }"#;

        let records = decode_tmdb_search(body, IMAGE_BASE).unwrap();
        assert_eq!(records.len(), 2);

        let matrix = &records[0];
        assert_eq!(matrix.id, 603);
        assert_eq!(matrix.year, Some(1999));
        assert_eq!(matrix.imdb_id.as_deref(), Some("tt0133093"));
        assert_eq!(
            matrix.posters.small.as_deref(),
            Some("https://image.tmdb.org/t/p/w92/matrix.jpg")
        );
        assert_eq!(
            matrix.posters.large.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/matrix.jpg")
        );
        assert!(matrix.runtime_minutes.is_none());

        let reloaded = &records[1];
        assert!(reloaded.year.is_none());
        assert!(reloaded.synopsis.is_none());
        assert!(reloaded.posters.is_empty());
    }

    #[test]
    fn test_decode_tmdb_search_malformed() {
        let result = decode_tmdb_search("{\"results\": [{\"id\": \"x\"}]}", IMAGE_BASE);
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_decode_streaming_catalog() {
        let body = r#"{
            "number_of_results": 12,
            "results_per_page": 5,
            "start_index": 0,
            "catalog_title": [
                {
                    "id": "http://api.example.com/catalog/titles/movies/60031236",
                    "title": {"regular": "Alien: Special Edition"},
                    "box_art": {"small": "s.jpg", "medium": "m.jpg", "large": "l.jpg"},
                    "release_year": 1979,
                    "runtime": 7020,
                    "synopsis": "In deep space...",
                    "directors": ["Ridley Scott"],
                    "links": {"web_page": "http://streaming.example.com/Movie/60031236"}
                }
            ]
        }"#;

        let catalog = decode_streaming_catalog(body).unwrap();
        assert_eq!(catalog.total_entries, 12);
        assert_eq!(catalog.per_page, 5);
        assert_eq!(catalog.titles.len(), 1);

        let alien = &catalog.titles[0];
        assert_eq!(alien.id, 60031236);
        assert_eq!(alien.title, "Alien");
        assert!(alien.special_edition);
        assert_eq!(alien.year, Some(1979));
        assert_eq!(alien.runtime_minutes, Some(117));
        assert_eq!(alien.directors, vec!["Ridley Scott"]);
        assert_eq!(alien.posters.medium.as_deref(), Some("m.jpg"));
        assert_eq!(
            alien.url.as_deref(),
            Some("http://streaming.example.com/Movie/60031236")
        );
    }

    #[test]
    fn test_decode_streaming_catalog_rejects_id_without_digits() {
        let body = r#"{"catalog_title": [{"id": "no-digits", "title": {"regular": "X"}}]}"#;
        let result = decode_streaming_catalog(body);
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_id_from_url() {
        assert_eq!(id_from_url("http://host/catalog/titles/movies/123"), Some(123));
        assert_eq!(id_from_url("http://host/v2/titles/42/"), Some(42));
        assert_eq!(id_from_url("nothing"), None);
    }

    #[test]
    fn test_decode_review_search() {
        let body = r#"{
            "total": 2,
            "movies": [
                {
                    "id": "770672122",
                    "title": "Toy Story 3",
                    "year": 2010,
                    "ratings": {"critics_score": 99, "audience_score": 91},
                    "alternate_ids": {"imdb": "0435761"},
                    "links": {"alternate": "http://reviews.example.com/m/toy_story_3/"}
                },
                {
                    "id": "9",
                    "title": "Untitled Project",
                    "year": "",
                    "ratings": {"critics_score": -1}
                }
            ]
        }"#;

        let reviews = decode_review_search(body).unwrap();
        assert_eq!(reviews.len(), 2);

        assert_eq!(reviews[0].imdb_id.as_deref(), Some("tt0435761"));
        assert_eq!(reviews[0].critics_score, Some(99));
        assert_eq!(reviews[0].audience_score, Some(91));
        assert_eq!(reviews[0].year, Some(2010));

        assert!(reviews[1].year.is_none());
        assert!(reviews[1].critics_score.is_none());
        assert!(reviews[1].imdb_id.is_none());
    }

    #[test]
    fn test_decode_review_search_string_year() {
        let body = r#"{"movies": [{"id": "1", "title": "Heat", "year": "1995"}]}"#;
        let reviews = decode_review_search(body).unwrap();
        assert_eq!(reviews[0].year, Some(1995));
    }
}
