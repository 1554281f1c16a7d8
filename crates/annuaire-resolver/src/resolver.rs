//! Close-match search

use crate::{ResolverConfig, ResolverError};
use annuaire_domain::similarity::{same_initial, similarity};
use annuaire_domain::traits::RecordStore;
use annuaire_domain::{Record, RecordId, StoredRecord};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// A stored record judged close to a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    /// The stored record
    pub existing: StoredRecord,

    /// Trigram similarity of the primary fields
    pub similarity: f64,

    /// Whether the secondary fields share their first character
    pub initial_match: bool,
}

/// Finds possible duplicates of candidate records
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    config: ResolverConfig,
}

impl DuplicateResolver {
    /// Create a new resolver with the given configuration
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Create a resolver with the default threshold
    pub fn default_config() -> Self {
        Self::new(ResolverConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Whether a stored record is a close match for the candidate
    ///
    /// Returns the scored match, or `None`. Both records must be of the same
    /// kind.
    pub fn score(&self, candidate: &Record, stored: &StoredRecord) -> Option<MatchCandidate> {
        if candidate.kind() != stored.kind() {
            return None;
        }
        let score = similarity(candidate.primary_value(), stored.record.primary_value());
        let initial_match = same_initial(candidate.secondary_value(), stored.record.secondary_value());

        (score > self.config.similarity_threshold || initial_match).then(|| MatchCandidate {
            existing: stored.clone(),
            similarity: score,
            initial_match,
        })
    }

    /// All close matches for `candidate` in the store, ordered by id
    ///
    /// Read-only. Records whose id is in `exclude` (rows written earlier in
    /// the same batch) are never reported.
    pub fn find_matches<S>(
        &self,
        candidate: &Record,
        store: &S,
        exclude: &HashSet<RecordId>,
    ) -> Result<Vec<MatchCandidate>, ResolverError>
    where
        S: RecordStore,
        S::Error: std::fmt::Display,
    {
        let rows = store
            .find_similar(
                candidate.kind(),
                candidate.primary_value(),
                candidate.secondary_value(),
                self.config.similarity_threshold,
            )
            .map_err(|e| ResolverError::Store(e.to_string()))?;

        let matches: Vec<MatchCandidate> = rows
            .iter()
            .filter(|row| !exclude.contains(&row.id))
            .filter_map(|row| self.score(candidate, row))
            .collect();

        debug!(
            kind = %candidate.kind(),
            candidate = %candidate.display_name(),
            looked_up = rows.len(),
            matches = matches.len(),
            "duplicate lookup"
        );
        Ok(matches)
    }
}
