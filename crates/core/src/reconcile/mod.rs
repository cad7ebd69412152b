//! Reconciliation of provider records into canonical movie drafts.
//!
//! The primary provider decides which movies exist. Streaming listings are
//! linked onto primary records (by a previously stored streaming ID, else by
//! title/year equality), review records are attached afterwards, and drafts
//! sharing an IMDB ID collapse to the first one.

use std::collections::HashMap;

use tracing::debug;

use crate::movie::{titles_match, CanonicalMovie};
use crate::provider::{PrimaryRecord, ReviewRecord, StreamingRecord};

/// Working set for one reconciliation.
struct SearchBatch<'a> {
    primary: Vec<PrimaryRecord>,
    /// Streaming listing linked to each primary record, by index.
    links: Vec<Option<&'a StreamingRecord>>,
    existing: HashMap<u32, CanonicalMovie>,
}

impl<'a> SearchBatch<'a> {
    fn new(primary: Vec<PrimaryRecord>, existing: HashMap<u32, CanonicalMovie>) -> Self {
        let links = vec![None; primary.len()];
        Self {
            primary,
            links,
            existing,
        }
    }

    /// Index of the unlinked primary record a streaming listing belongs to.
    ///
    /// A stored movie that already carries this streaming ID pins the link to
    /// its own primary record; title/year equality is only consulted when no
    /// stored movie claims the listing.
    fn link_target(&self, streaming: &StreamingRecord) -> Option<usize> {
        let claimed_by = self.primary.iter().position(|p| {
            self.existing
                .get(&p.id)
                .is_some_and(|m| m.streaming_id == Some(streaming.id))
        });

        match claimed_by {
            Some(idx) => self.links[idx].is_none().then_some(idx),
            None => self
                .primary
                .iter()
                .enumerate()
                .find(|(idx, p)| self.links[*idx].is_none() && p.matches_streaming(streaming))
                .map(|(idx, _)| idx),
        }
    }

    fn link(&mut self, streaming: &'a StreamingRecord) {
        match self.link_target(streaming) {
            Some(idx) => {
                debug!(
                    streaming_id = streaming.id,
                    primary_id = self.primary[idx].id,
                    "Linked streaming title"
                );
                self.links[idx] = Some(streaming);
            }
            None => {
                debug!(
                    streaming_id = streaming.id,
                    title = %streaming.title,
                    "Streaming title has no primary match"
                );
            }
        }
    }

    /// Produce drafts in primary order, skipping IMDB duplicates.
    ///
    /// A skipped duplicate hands its streaming link to the surviving draft
    /// when the survivor was not linked itself.
    fn make_all(mut self) -> Vec<CanonicalMovie> {
        let mut drafts: Vec<CanonicalMovie> = Vec::with_capacity(self.primary.len());
        let mut linked: Vec<bool> = Vec::with_capacity(self.primary.len());
        let mut by_imdb: HashMap<String, usize> = HashMap::new();

        for (record, link) in self.primary.iter().zip(&self.links) {
            let mut movie = self.existing.remove(&record.id).unwrap_or_default();
            movie.apply_primary(record);

            if let Some(imdb_id) = movie.imdb_key() {
                if let Some(&idx) = by_imdb.get(imdb_id) {
                    debug!(
                        primary_id = record.id,
                        imdb_id = %imdb_id,
                        "Skipping duplicate IMDB ID"
                    );
                    if let (Some(streaming), false) = (link, linked[idx]) {
                        drafts[idx].apply_streaming(streaming);
                        linked[idx] = true;
                    }
                    continue;
                }
                by_imdb.insert(imdb_id.to_string(), drafts.len());
            }

            if let Some(streaming) = link {
                movie.apply_streaming(streaming);
            }
            linked.push(link.is_some());
            drafts.push(movie);
        }

        drafts
    }
}

/// Merge primary and streaming records into canonical drafts.
///
/// `existing` holds already-persisted movies keyed by primary ID; matching
/// drafts update those movies in place. Drafts come back in the order the
/// primary records were supplied. Streaming records with no primary match
/// produce nothing.
pub fn reconcile(
    primary: Vec<PrimaryRecord>,
    streaming: &[StreamingRecord],
    existing: HashMap<u32, CanonicalMovie>,
) -> Vec<CanonicalMovie> {
    let mut batch = SearchBatch::new(primary, existing);
    for record in streaming {
        batch.link(record);
    }
    batch.make_all()
}

/// Whether a review record describes the given draft.
///
/// IMDB IDs decide when both sides have one; otherwise title/year equality.
fn review_matches(movie: &CanonicalMovie, review: &ReviewRecord) -> bool {
    let review_imdb = review.imdb_id.as_deref().filter(|id| !id.is_empty());
    match (movie.imdb_key(), review_imdb) {
        (Some(a), Some(b)) => a == b,
        _ => titles_match(&movie.title, movie.year, &review.title, review.year),
    }
}

/// Attach at most one review to each draft.
///
/// Each matching review is consumed from the pool, so a review is never
/// attached twice. Reviews nobody claimed are returned.
pub fn attach_reviews(
    drafts: &mut [CanonicalMovie],
    mut reviews: Vec<ReviewRecord>,
) -> Vec<ReviewRecord> {
    for movie in drafts.iter_mut() {
        if let Some(idx) = reviews.iter().position(|r| review_matches(movie, r)) {
            let review = reviews.remove(idx);
            movie.apply_review(&review);
        }
    }
    reviews
}
