//! All-or-nothing batch commit with per-record duplicate resolution

use crate::error::IngestError;
use annuaire_domain::traits::RecordStore;
use annuaire_domain::{processing_date, Record, RecordId, RecordKind, StoredRecord};
use annuaire_resolver::{DuplicateResolver, MatchCandidate};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// Outcome class of a batch call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Every candidate was inserted
    Created,
    /// At least one candidate was held back as a possible duplicate
    Conflict,
    /// The batch failed and nothing was committed
    Error,
}

impl BatchStatus {
    /// Status of a finished batch call
    pub fn of(outcome: &Result<BatchResult, IngestError>) -> Self {
        match outcome {
            Ok(result) => result.status(),
            Err(_) => BatchStatus::Error,
        }
    }
}

/// A candidate that was not inserted, with the stored records it resembles
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// The held-back candidate
    pub candidate: Record,
    /// Close matches, ordered by id
    pub matches: Vec<MatchCandidate>,
}

/// What a committed batch did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    /// Inserted records with their new ids, in candidate order
    pub inserted_records: Vec<StoredRecord>,
    /// Candidates held back as possible duplicates, in candidate order
    pub duplicate_groups: Vec<DuplicateGroup>,
}

impl BatchResult {
    /// `Conflict` if any candidate was held back, `Created` otherwise
    pub fn status(&self) -> BatchStatus {
        if self.duplicate_groups.is_empty() {
            BatchStatus::Created
        } else {
            BatchStatus::Conflict
        }
    }
}

/// An open store transaction that rolls back unless committed
///
/// Dropping the scope on any exit path (early return, `?`, panic unwinding)
/// discards the writes made through it.
pub struct BatchScope<'a, S>
where
    S: RecordStore,
    S::Error: Display,
{
    store: &'a mut S,
    open: bool,
}

impl<'a, S> BatchScope<'a, S>
where
    S: RecordStore,
    S::Error: Display,
{
    /// Open a transaction on `store`
    pub fn begin(store: &'a mut S) -> Result<Self, IngestError> {
        store.begin().map_err(IngestError::database)?;
        Ok(Self { store, open: true })
    }

    /// Read access for duplicate lookups
    pub fn store(&self) -> &S {
        self.store
    }

    /// Write access for inserts and updates
    pub fn store_mut(&mut self) -> &mut S {
        self.store
    }

    /// Commit the transaction
    ///
    /// If the commit itself fails the scope stays open and the drop rolls
    /// it back.
    pub fn commit(mut self) -> Result<(), IngestError> {
        self.store.commit().map_err(IngestError::database)?;
        self.open = false;
        Ok(())
    }

    /// Discard every write made through the scope
    pub fn rollback(mut self) -> Result<(), IngestError> {
        self.open = false;
        self.store.rollback().map_err(IngestError::database)
    }
}

impl<S> Drop for BatchScope<'_, S>
where
    S: RecordStore,
    S::Error: Display,
{
    fn drop(&mut self) {
        if self.open {
            debug!("rolling back uncommitted batch");
            if let Err(e) = self.store.rollback() {
                warn!("Rollback failed: {}", e);
            }
        }
    }
}

/// Normalize a client or model record for writing
///
/// Trims text, turns empty strings into nulls and stamps the last-modified
/// date. The record must then still carry its required fields.
fn prepare(record: &mut Record, date: &str) -> Result<(), annuaire_domain::RecordError> {
    record.normalize();
    record.touch(date);
    record.validate()
}

/// Writes batches of records to a [`RecordStore`]
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    resolver: DuplicateResolver,
}

impl BatchCoordinator {
    /// Create a coordinator around a duplicate resolver
    pub fn new(resolver: DuplicateResolver) -> Self {
        Self { resolver }
    }

    /// The resolver consulted for each candidate
    pub fn resolver(&self) -> &DuplicateResolver {
        &self.resolver
    }

    /// Insert `candidates`, holding back possible duplicates
    ///
    /// Candidates are handled in order inside one transaction. A candidate
    /// with close matches among the records that existed before the batch
    /// becomes a [`DuplicateGroup`]; every other candidate is inserted. Any
    /// store failure rolls back every insert of the call.
    pub fn commit_batch<S>(
        &self,
        store: &mut S,
        kind: RecordKind,
        candidates: Vec<Record>,
    ) -> Result<BatchResult, IngestError>
    where
        S: RecordStore,
        S::Error: Display,
    {
        let date = processing_date();
        let mut candidates = candidates;
        for (index, record) in candidates.iter_mut().enumerate() {
            if record.kind() != kind {
                return Err(IngestError::Validation(format!(
                    "entry {}: expected a {} record, got {}",
                    index,
                    kind,
                    record.kind()
                )));
            }
            prepare(record, &date)
                .map_err(|e| IngestError::Validation(format!("entry {}: {}", index, e)))?;
        }

        let mut result = BatchResult::default();
        if candidates.is_empty() {
            info!(%kind, "empty batch, nothing to write");
            return Ok(result);
        }

        let mut scope = BatchScope::begin(store)?;
        let mut batch_ids: HashSet<RecordId> = HashSet::new();

        for candidate in candidates {
            let matches = self
                .resolver
                .find_matches(&candidate, scope.store(), &batch_ids)
                .map_err(IngestError::database)?;

            if matches.is_empty() {
                let id = scope
                    .store_mut()
                    .insert(&candidate)
                    .map_err(IngestError::database)?;
                debug!(%kind, %id, name = %candidate.display_name(), "inserted");
                batch_ids.insert(id);
                result.inserted_records.push(StoredRecord::new(id, candidate));
            } else {
                debug!(
                    %kind,
                    name = %candidate.display_name(),
                    matches = matches.len(),
                    "possible duplicate held back"
                );
                result.duplicate_groups.push(DuplicateGroup { candidate, matches });
            }
        }

        scope.commit()?;

        info!(
            %kind,
            inserted = result.inserted_records.len(),
            duplicates = result.duplicate_groups.len(),
            "Batch committed"
        );
        Ok(result)
    }

    /// Overwrite stored records by id, all or nothing
    ///
    /// Returns the number of updated records. An id that matches no stored
    /// record is a database error and rolls back the whole call.
    pub fn replace_batch<S>(
        &self,
        store: &mut S,
        kind: RecordKind,
        entries: Vec<(RecordId, Record)>,
    ) -> Result<usize, IngestError>
    where
        S: RecordStore,
        S::Error: Display,
    {
        let date = processing_date();
        let mut entries = entries;
        for (index, (_, record)) in entries.iter_mut().enumerate() {
            if record.kind() != kind {
                return Err(IngestError::Validation(format!(
                    "entry {}: expected a {} record, got {}",
                    index,
                    kind,
                    record.kind()
                )));
            }
            prepare(record, &date)
                .map_err(|e| IngestError::Validation(format!("entry {}: {}", index, e)))?;
        }

        let mut scope = BatchScope::begin(store)?;
        for (id, record) in &entries {
            scope
                .store_mut()
                .update(*id, record)
                .map_err(IngestError::database)?;
            debug!(%kind, %id, "updated");
        }
        scope.commit()?;

        info!(%kind, updated = entries.len(), "Replace committed");
        Ok(entries.len())
    }

    /// Insert one record without duplicate resolution
    pub fn add_entry<S>(&self, store: &mut S, record: Record) -> Result<StoredRecord, IngestError>
    where
        S: RecordStore,
        S::Error: Display,
    {
        let mut record = record;
        prepare(&mut record, &processing_date())
            .map_err(|e| IngestError::Validation(e.to_string()))?;

        let mut scope = BatchScope::begin(store)?;
        let id = scope
            .store_mut()
            .insert(&record)
            .map_err(IngestError::database)?;
        scope.commit()?;

        info!(kind = %record.kind(), %id, "Entry added");
        Ok(StoredRecord::new(id, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuaire_domain::{DirectoryEntry, EventEntry};
    use std::collections::BTreeMap;

    /// In-memory store with a write journal so rollbacks can be observed
    #[derive(Default)]
    struct JournalStore {
        committed: BTreeMap<i64, Record>,
        pending: Option<BTreeMap<i64, Record>>,
        next_id: i64,
        fail_insert_at: Option<usize>,
        inserts: usize,
        rollbacks: usize,
    }

    impl JournalStore {
        fn rows(&self) -> &BTreeMap<i64, Record> {
            self.pending.as_ref().unwrap_or(&self.committed)
        }
    }

    impl RecordStore for JournalStore {
        type Error = String;

        fn fetch_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, String> {
            Ok(self
                .rows()
                .iter()
                .filter(|(_, r)| r.kind() == kind)
                .map(|(id, r)| StoredRecord::new(RecordId(*id), r.clone()))
                .collect())
        }

        fn find_similar(
            &self,
            kind: RecordKind,
            _primary: &str,
            _secondary: &str,
            _threshold: f64,
        ) -> Result<Vec<StoredRecord>, String> {
            self.fetch_all(kind)
        }

        fn insert(&mut self, record: &Record) -> Result<RecordId, String> {
            self.inserts += 1;
            if self.fail_insert_at == Some(self.inserts) {
                return Err("disk full".to_string());
            }
            self.next_id += 1;
            let id = self.next_id;
            self.pending
                .as_mut()
                .ok_or("no transaction")?
                .insert(id, record.clone());
            Ok(RecordId(id))
        }

        fn update(&mut self, id: RecordId, record: &Record) -> Result<(), String> {
            let rows = self.pending.as_mut().ok_or("no transaction")?;
            match rows.get_mut(&id.0) {
                Some(slot) => {
                    *slot = record.clone();
                    Ok(())
                }
                None => Err(format!("no row {}", id)),
            }
        }

        fn begin(&mut self) -> Result<(), String> {
            self.pending = Some(self.committed.clone());
            Ok(())
        }

        fn commit(&mut self) -> Result<(), String> {
            self.committed = self.pending.take().ok_or("no transaction")?;
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), String> {
            self.rollbacks += 1;
            self.pending = None;
            Ok(())
        }
    }

    fn person(nom: &str, prenom: &str) -> Record {
        DirectoryEntry {
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            ..Default::default()
        }
        .into()
    }

    fn coordinator() -> BatchCoordinator {
        BatchCoordinator::new(DuplicateResolver::default_config())
    }

    #[test]
    fn test_scope_rolls_back_on_drop() {
        let mut store = JournalStore::default();
        {
            let mut scope = BatchScope::begin(&mut store).unwrap();
            scope.store_mut().insert(&person("Dupont", "Jean")).unwrap();
        }
        assert_eq!(store.rollbacks, 1);
        assert!(store.committed.is_empty());
    }

    #[test]
    fn test_scope_commit_does_not_roll_back() {
        let mut store = JournalStore::default();
        let mut scope = BatchScope::begin(&mut store).unwrap();
        scope.store_mut().insert(&person("Dupont", "Jean")).unwrap();
        scope.commit().unwrap();
        assert_eq!(store.rollbacks, 0);
        assert_eq!(store.committed.len(), 1);
    }

    #[test]
    fn test_batch_inserts_and_holds_back() {
        let mut store = JournalStore::default();
        let coord = coordinator();
        coord
            .commit_batch(&mut store, RecordKind::DirectoryEntry, vec![person("Dupont", "Jean")])
            .unwrap();

        let result = coord
            .commit_batch(
                &mut store,
                RecordKind::DirectoryEntry,
                vec![person("Dupond", "Jeanne"), person("Zimmer", "Karl")],
            )
            .unwrap();

        assert_eq!(result.status(), BatchStatus::Conflict);
        assert_eq!(result.duplicate_groups.len(), 1);
        assert_eq!(result.duplicate_groups[0].matches[0].existing.id, RecordId(1));
        assert_eq!(result.inserted_records.len(), 1);
        assert_eq!(result.inserted_records[0].id, RecordId(2));
        assert_eq!(store.committed.len(), 2);
    }

    #[test]
    fn test_same_batch_records_are_not_cross_checked() {
        let mut store = JournalStore::default();
        let result = coordinator()
            .commit_batch(
                &mut store,
                RecordKind::DirectoryEntry,
                vec![person("Dupont", "Jean"), person("Dupont", "Jean")],
            )
            .unwrap();

        assert_eq!(result.status(), BatchStatus::Created);
        assert_eq!(result.inserted_records.len(), 2);
    }

    #[test]
    fn test_insert_failure_rolls_back_everything() {
        let mut store = JournalStore {
            fail_insert_at: Some(2),
            ..Default::default()
        };
        let outcome = coordinator().commit_batch(
            &mut store,
            RecordKind::DirectoryEntry,
            vec![person("Alpha", "Anne"), person("Bravo", "Bruno")],
        );

        assert!(matches!(outcome, Err(IngestError::Database(_))));
        assert_eq!(BatchStatus::of(&outcome), BatchStatus::Error);
        assert_eq!(store.rollbacks, 1);
        assert!(store.committed.is_empty());
    }

    #[test]
    fn test_candidates_are_stamped_and_normalized() {
        let mut store = JournalStore::default();
        let mut candidate = DirectoryEntry {
            nom: " Dupont ".to_string(),
            prenom: "Jean".to_string(),
            localite: Some("  ".to_string()),
            date_derniere_modification: Some("1999-01-01".to_string()),
            ..Default::default()
        };
        candidate.courriel = Some("".to_string());

        let result = coordinator()
            .commit_batch(&mut store, RecordKind::DirectoryEntry, vec![candidate.into()])
            .unwrap();

        let stored = &result.inserted_records[0].record;
        assert_eq!(stored.primary_value(), "Dupont");
        assert_eq!(stored.last_modified(), Some(processing_date().as_str()));
        let Record::Directory(entry) = stored else {
            panic!("expected a directory entry");
        };
        assert_eq!(entry.localite, None);
        assert_eq!(entry.courriel, None);
    }

    #[test]
    fn test_kind_mismatch_is_rejected_before_store_access() {
        let mut store = JournalStore::default();
        let event: Record = EventEntry {
            nom_evenement: "Fête".to_string(),
            ..Default::default()
        }
        .into();

        let err = coordinator()
            .commit_batch(&mut store, RecordKind::DirectoryEntry, vec![event])
            .unwrap_err();
        assert!(matches!(err, IngestError::Validation(_)));
        assert_eq!(store.inserts, 0);
    }

    #[test]
    fn test_empty_batch_is_created() {
        let mut store = JournalStore::default();
        let result = coordinator()
            .commit_batch(&mut store, RecordKind::EventEntry, Vec::new())
            .unwrap();
        assert_eq!(result.status(), BatchStatus::Created);
        assert!(store.pending.is_none());
    }

    #[test]
    fn test_replace_unknown_id_rolls_back() {
        let mut store = JournalStore::default();
        let coord = coordinator();
        coord
            .commit_batch(&mut store, RecordKind::DirectoryEntry, vec![person("Dupont", "Jean")])
            .unwrap();

        let err = coord
            .replace_batch(
                &mut store,
                RecordKind::DirectoryEntry,
                vec![
                    (RecordId(1), person("Dupont", "Jacques")),
                    (RecordId(99), person("Ghost", "Gus")),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, IngestError::Database(_)));
        assert_eq!(store.committed[&1].secondary_value(), "Jean");
    }

    #[test]
    fn test_add_entry_skips_duplicate_resolution() {
        let mut store = JournalStore::default();
        let coord = coordinator();
        coord.add_entry(&mut store, person("Dupont", "Jean")).unwrap();
        let second = coord.add_entry(&mut store, person("Dupont", "Jean")).unwrap();
        assert_eq!(second.id, RecordId(2));
        assert_eq!(store.committed.len(), 2);
    }
}
