//! In-memory movie store for testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::movie::{CanonicalMovie, TitlePattern};
use crate::store::{MovieStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    movies: Vec<CanonicalMovie>,
    unavailable: bool,
    failing_primary_lookups: bool,
    failing_titles: HashSet<String>,
    next_id: u64,
}

/// [`MovieStore`] kept in a `Vec`, with failure injection.
///
/// Create-or-update follows the same lookup order as the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryMovieStore {
    inner: Mutex<Inner>,
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Lock poisoned: {}", e)))
    }

    /// Insert a movie directly, assigning an ID when it has none.
    pub fn insert(&self, movie: CanonicalMovie) -> String {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.next_id += 1;
        let id = movie
            .id
            .clone()
            .unwrap_or_else(|| format!("mem-{}", inner.next_id));
        inner.movies.push(CanonicalMovie {
            id: Some(id.clone()),
            ..movie
        });
        id
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).unavailable = unavailable;
    }

    /// Make only primary-ID lookups fail; everything else keeps working.
    pub fn fail_primary_lookups(&self, failing: bool) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failing_primary_lookups = failing;
    }

    /// Make saves of movies with this exact title fail.
    pub fn fail_saves_for_title(&self, title: &str) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .failing_titles
            .insert(title.to_string());
    }

    /// Snapshot of all stored movies, in insertion order.
    pub fn movies(&self) -> Vec<CanonicalMovie> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .movies
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn available(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let inner = self.lock()?;
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(inner)
    }
}

fn position_of(movies: &[CanonicalMovie], movie: &CanonicalMovie) -> Option<usize> {
    if let Some(id) = &movie.id {
        if let Some(pos) = movies.iter().position(|m| m.id.as_ref() == Some(id)) {
            return Some(pos);
        }
    }
    if let Some(primary_id) = movie.primary_id {
        if let Some(pos) = movies.iter().position(|m| m.primary_id == Some(primary_id)) {
            return Some(pos);
        }
    }
    if let Some(imdb_id) = movie.imdb_key() {
        if let Some(pos) = movies.iter().position(|m| m.imdb_key() == Some(imdb_id)) {
            return Some(pos);
        }
    }
    movies.iter().position(|m| {
        m.imdb_key().is_none()
            && (m.primary_id.is_none() || movie.primary_id.is_none())
            && m.title == movie.title
            && m.year == movie.year
    })
}

impl MovieStore for MemoryMovieStore {
    fn find_by_primary_ids(&self, ids: &[u32]) -> Result<HashMap<u32, CanonicalMovie>, StoreError> {
        let inner = self.available()?;
        if inner.failing_primary_lookups {
            return Err(StoreError::Database("injected primary lookup failure".to_string()));
        }
        Ok(inner
            .movies
            .iter()
            .filter_map(|m| m.primary_id.filter(|id| ids.contains(id)).map(|id| (id, m.clone())))
            .collect())
    }

    fn find_by_streaming_ids(
        &self,
        ids: &[u64],
    ) -> Result<HashMap<u64, CanonicalMovie>, StoreError> {
        let inner = self.available()?;
        Ok(inner
            .movies
            .iter()
            .filter_map(|m| {
                m.streaming_id
                    .filter(|id| ids.contains(id))
                    .map(|id| (id, m.clone()))
            })
            .collect())
    }

    fn find_by_title_pattern(
        &self,
        pattern: &TitlePattern,
    ) -> Result<Vec<CanonicalMovie>, StoreError> {
        let inner = self.available()?;
        let mut found: Vec<CanonicalMovie> = inner
            .movies
            .iter()
            .filter(|m| pattern.is_match(&m.title))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(found)
    }

    fn save(&self, movie: &CanonicalMovie) -> Result<String, StoreError> {
        let mut inner = self.available()?;
        if inner.failing_titles.contains(&movie.title) {
            return Err(StoreError::Database(format!(
                "injected failure for '{}'",
                movie.title
            )));
        }

        let mut stored = movie.clone();
        stored.updated_at = Some(Utc::now());

        match position_of(&inner.movies, movie) {
            Some(pos) => {
                let id = inner.movies[pos]
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("mem-{}", pos));
                stored.id = Some(id.clone());
                inner.movies[pos] = stored;
                Ok(id)
            }
            None => {
                inner.next_id += 1;
                let id = format!("mem-{}", inner.next_id);
                stored.id = Some(id.clone());
                inner.movies.push(stored);
                Ok(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_save_updates_by_primary_id() {
        let store = MemoryMovieStore::new();
        let movie = CanonicalMovie::from_primary(&fixtures::primary_record(1, "Heat", 1995));

        let first = store.save(&movie).unwrap();
        let second = store.save(&movie).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unavailable_store_errors() {
        let store = MemoryMovieStore::new();
        store.set_unavailable(true);

        let result = store.find_by_primary_ids(&[1]);
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_failing_primary_lookups_leave_other_operations_working() {
        let store = MemoryMovieStore::new();
        store.insert(CanonicalMovie::from_primary(&fixtures::primary_record(1, "Heat", 1995)));
        store.fail_primary_lookups(true);

        assert!(matches!(store.find_by_primary_ids(&[1]), Err(StoreError::Database(_))));
        let pattern = TitlePattern::whole_word("heat").unwrap();
        assert_eq!(store.find_by_title_pattern(&pattern).unwrap().len(), 1);
    }
}
