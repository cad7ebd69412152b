//! Title normalization, cross-provider title equality and title patterns.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use thiserror::Error;

static SPECIAL_EDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\s*:)?\s+special edition$").expect("special edition pattern is valid")
});

/// Normalize a title for equality checks.
///
/// Lowercases, treats every non-alphanumeric character as a separator and
/// collapses runs of separators into a single space.
pub fn normalize_title(title: &str) -> String {
    let mapped: String = title
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decide whether two (title, year) pairs describe the same movie.
///
/// Normalized titles must be equal. Years must be equal when both are known;
/// when either side lacks a year the title alone decides.
pub fn titles_match(
    title_a: &str,
    year_a: Option<u16>,
    title_b: &str,
    year_b: Option<u16>,
) -> bool {
    let (norm_a, norm_b) = (normalize_title(title_a), normalize_title(title_b));
    if norm_a.is_empty() || norm_a != norm_b {
        return false;
    }
    match (year_a, year_b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// Strip a trailing "special edition" marker from a streaming title.
///
/// Returns the cleaned title and whether the marker was present.
pub fn strip_special_edition(title: &str) -> (String, bool) {
    match SPECIAL_EDITION.find(title) {
        Some(m) => (title[..m.start()].to_string(), true),
        None => (title.to_string(), false),
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid title pattern '{pattern}': {message}")]
    Invalid { pattern: String, message: String },
}

/// A case-insensitive title pattern used by the local fallback search.
///
/// Case folding and word boundaries are Unicode-aware, so "amélie" matches
/// "AMÉLIE".
#[derive(Debug, Clone)]
pub struct TitlePattern {
    regex: Regex,
}

impl TitlePattern {
    /// Match `term` as a whole word (or phrase), case-insensitively.
    ///
    /// The term is escaped, so "matrix" matches "The Matrix" but not
    /// "Matrices".
    pub fn whole_word(term: &str) -> Result<Self, PatternError> {
        let pattern = format!(r"\b{}\b", regex::escape(term));
        Ok(Self {
            regex: Self::build(&pattern)?,
        })
    }

    /// Use `pattern` as a raw regular expression wrapped in word boundaries.
    pub fn raw(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            regex: Self::build(&format!(r"\b{}\b", pattern))?,
        })
    }

    fn build(pattern: &str) -> Result<Regex, PatternError> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| PatternError::Invalid {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn is_match(&self, title: &str) -> bool {
        self.regex.is_match(title)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}
