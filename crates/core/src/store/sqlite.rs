//! SQLite-backed movie store implementation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::{MovieStore, StoreError};
use crate::movie::{CanonicalMovie, PosterUrls, TitlePattern};

const MOVIE_COLUMNS: &str = "id, primary_id, streaming_id, review_id, imdb_id, title, year,
    runtime_minutes, poster_small, poster_medium, poster_large, synopsis, cast_json,
    directors_json, special_edition, review_score, homepage, wikipedia_url, streaming_url,
    review_url, updated_at";

/// SQLite-backed movie store.
pub struct SqliteMovieStore {
    conn: Mutex<Connection>,
}

impl SqliteMovieStore {
    /// Open (or create) a store at the given path.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS movies (
                id TEXT PRIMARY KEY,
                primary_id INTEGER UNIQUE,
                streaming_id INTEGER,
                review_id TEXT,
                imdb_id TEXT,
                title TEXT NOT NULL,
                year INTEGER,
                runtime_minutes INTEGER,
                poster_small TEXT,
                poster_medium TEXT,
                poster_large TEXT,
                synopsis TEXT,
                cast_json TEXT NOT NULL DEFAULT '[]',
                directors_json TEXT NOT NULL DEFAULT '[]',
                special_edition INTEGER NOT NULL DEFAULT 0,
                review_score INTEGER,
                homepage TEXT,
                wikipedia_url TEXT,
                streaming_url TEXT,
                review_url TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_movies_streaming_id ON movies(streaming_id);
            CREATE INDEX IF NOT EXISTS idx_movies_imdb_id ON movies(imdb_id);
            CREATE INDEX IF NOT EXISTS idx_movies_title ON movies(title);
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("connection lock poisoned: {}", e)))
    }

    fn row_to_movie(row: &Row) -> rusqlite::Result<CanonicalMovie> {
        let streaming_id: Option<i64> = row.get(2)?;
        let cast_json: String = row.get(12)?;
        let directors_json: String = row.get(13)?;
        let updated_at_str: String = row.get(20)?;

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .ok();

        Ok(CanonicalMovie {
            id: Some(row.get(0)?),
            primary_id: row.get(1)?,
            streaming_id: streaming_id.map(|id| id as u64),
            review_id: row.get(3)?,
            imdb_id: row.get(4)?,
            title: row.get(5)?,
            year: row.get(6)?,
            runtime_minutes: row.get(7)?,
            posters: PosterUrls {
                small: row.get(8)?,
                medium: row.get(9)?,
                large: row.get(10)?,
            },
            synopsis: row.get(11)?,
            cast: parse_names(12, &cast_json)?,
            directors: parse_names(13, &directors_json)?,
            special_edition: row.get(14)?,
            review_score: row.get(15)?,
            homepage: row.get(16)?,
            wikipedia_url: row.get(17)?,
            streaming_url: row.get(18)?,
            review_url: row.get(19)?,
            updated_at,
        })
    }

    /// Run a `SELECT ... WHERE <column> IN (...)` over the given keys.
    fn select_in<K: rusqlite::ToSql>(
        conn: &Connection,
        column: &str,
        keys: &[K],
    ) -> Result<Vec<CanonicalMovie>, StoreError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM movies WHERE {} IN ({})",
            MOVIE_COLUMNS, column, placeholders
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(keys.iter()), Self::row_to_movie)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut movies = Vec::new();
        for row in rows {
            movies.push(row.map_err(|e| StoreError::Database(e.to_string()))?);
        }
        Ok(movies)
    }

    /// Locate the row a save should update, if any.
    fn resolve_existing_id(
        conn: &Connection,
        movie: &CanonicalMovie,
    ) -> Result<Option<String>, StoreError> {
        let lookup = |sql: &str, key: &dyn rusqlite::ToSql| -> Result<Option<String>, StoreError> {
            conn.query_row(sql, params![key], |row| row.get(0))
                .optional()
                .map_err(|e| StoreError::Database(e.to_string()))
        };

        if let Some(id) = &movie.id {
            if let Some(found) = lookup("SELECT id FROM movies WHERE id = ?", id)? {
                return Ok(Some(found));
            }
        }
        if let Some(primary_id) = movie.primary_id {
            if let Some(found) = lookup("SELECT id FROM movies WHERE primary_id = ?", &primary_id)? {
                return Ok(Some(found));
            }
        }
        if let Some(imdb_id) = movie.imdb_key() {
            if let Some(found) = lookup("SELECT id FROM movies WHERE imdb_id = ?", &imdb_id)? {
                return Ok(Some(found));
            }
        }

        // Title and year never claim a row that belongs to another primary record.
        conn.query_row(
            "SELECT id FROM movies
             WHERE title = ?1 AND year IS ?2 AND imdb_id IS NULL
               AND (primary_id IS NULL OR ?3 IS NULL)",
            params![&movie.title, movie.year, movie.primary_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn parse_names(idx: usize, json: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl MovieStore for SqliteMovieStore {
    fn find_by_primary_ids(&self, ids: &[u32]) -> Result<HashMap<u32, CanonicalMovie>, StoreError> {
        let conn = self.lock()?;
        let movies = Self::select_in(&conn, "primary_id", ids)?;
        Ok(movies
            .into_iter()
            .filter_map(|m| m.primary_id.map(|id| (id, m)))
            .collect())
    }

    fn find_by_streaming_ids(
        &self,
        ids: &[u64],
    ) -> Result<HashMap<u64, CanonicalMovie>, StoreError> {
        let conn = self.lock()?;
        let keys: Vec<i64> = ids.iter().map(|id| *id as i64).collect();
        let movies = Self::select_in(&conn, "streaming_id", &keys)?;
        Ok(movies
            .into_iter()
            .filter_map(|m| m.streaming_id.map(|id| (id, m)))
            .collect())
    }

    fn find_by_title_pattern(
        &self,
        pattern: &TitlePattern,
    ) -> Result<Vec<CanonicalMovie>, StoreError> {
        let conn = self.lock()?;

        // SQLite LIKE only folds ASCII case, so every title goes through the regex.
        let sql = format!(
            "SELECT {} FROM movies ORDER BY title COLLATE NOCASE, title",
            MOVIE_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_movie)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut movies = Vec::new();
        for row in rows {
            let movie = row.map_err(|e| StoreError::Database(e.to_string()))?;
            if pattern.is_match(&movie.title) {
                movies.push(movie);
            }
        }

        debug!(pattern = pattern.as_str(), matches = movies.len(), "Title pattern search");
        Ok(movies)
    }

    fn save(&self, movie: &CanonicalMovie) -> Result<String, StoreError> {
        let conn = self.lock()?;
        let now_str = Utc::now().to_rfc3339();

        let cast_json = serde_json::to_string(&movie.cast)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let directors_json = serde_json::to_string(&movie.directors)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let streaming_id = movie.streaming_id.map(|id| id as i64);

        match Self::resolve_existing_id(&conn, movie)? {
            Some(id) => {
                conn.execute(
                    "UPDATE movies SET primary_id = ?, streaming_id = ?, review_id = ?, imdb_id = ?,
                        title = ?, year = ?, runtime_minutes = ?, poster_small = ?,
                        poster_medium = ?, poster_large = ?, synopsis = ?, cast_json = ?,
                        directors_json = ?, special_edition = ?, review_score = ?, homepage = ?,
                        wikipedia_url = ?, streaming_url = ?, review_url = ?, updated_at = ?
                     WHERE id = ?",
                    params![
                        movie.primary_id,
                        streaming_id,
                        &movie.review_id,
                        movie.imdb_key(),
                        &movie.title,
                        movie.year,
                        movie.runtime_minutes,
                        &movie.posters.small,
                        &movie.posters.medium,
                        &movie.posters.large,
                        &movie.synopsis,
                        &cast_json,
                        &directors_json,
                        movie.special_edition,
                        movie.review_score,
                        &movie.homepage,
                        &movie.wikipedia_url,
                        &movie.streaming_url,
                        &movie.review_url,
                        &now_str,
                        &id,
                    ],
                )
                .map_err(|e| StoreError::Database(e.to_string()))?;
                Ok(id)
            }
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO movies (id, primary_id, streaming_id, review_id, imdb_id, title,
                        year, runtime_minutes, poster_small, poster_medium, poster_large, synopsis,
                        cast_json, directors_json, special_edition, review_score, homepage,
                        wikipedia_url, streaming_url, review_url, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    params![
                        &id,
                        movie.primary_id,
                        streaming_id,
                        &movie.review_id,
                        movie.imdb_key(),
                        &movie.title,
                        movie.year,
                        movie.runtime_minutes,
                        &movie.posters.small,
                        &movie.posters.medium,
                        &movie.posters.large,
                        &movie.synopsis,
                        &cast_json,
                        &directors_json,
                        movie.special_edition,
                        movie.review_score,
                        &movie.homepage,
                        &movie.wikipedia_url,
                        &movie.streaming_url,
                        &movie.review_url,
                        &now_str,
                        &now_str,
                    ],
                )
                .map_err(|e| StoreError::Database(e.to_string()))?;
                Ok(id)
            }
        }
    }
}
