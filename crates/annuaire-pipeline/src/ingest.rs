//! Request orchestration: acquisition, extraction, then the store

use crate::acquisition::{Source, SourceReader, TextSource};
use crate::batch::{BatchCoordinator, BatchResult};
use crate::error::IngestError;
use crate::payload::{parse_add_payload, parse_replace_payload};
use annuaire_domain::traits::{LlmProvider, RecordStore};
use annuaire_domain::{RecordKind, StoredRecord};
use annuaire_extractor::Extractor;
use serde_json::Value;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Runs ingestion, listing, replace and add requests against one store
///
/// The store sits behind a mutex and is only touched on the blocking pool,
/// so one batch holds the connection from `begin` to `commit`.
pub struct Ingestor<L, S, A = SourceReader>
where
    L: LlmProvider,
{
    extractor: Extractor<L>,
    coordinator: BatchCoordinator,
    store: Arc<Mutex<S>>,
    sources: A,
}

impl<L, S, A> Ingestor<L, S, A>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    S: RecordStore + Send + 'static,
    S::Error: Display,
    A: TextSource + Sync,
{
    /// Create an ingestor that owns `store`
    pub fn new(
        extractor: Extractor<L>,
        coordinator: BatchCoordinator,
        store: S,
        sources: A,
    ) -> Self {
        Self::with_shared_store(extractor, coordinator, Arc::new(Mutex::new(store)), sources)
    }

    /// Create an ingestor around a store shared with other components
    pub fn with_shared_store(
        extractor: Extractor<L>,
        coordinator: BatchCoordinator,
        store: Arc<Mutex<S>>,
        sources: A,
    ) -> Self {
        Self {
            extractor,
            coordinator,
            store,
            sources,
        }
    }

    /// Shared handle on the store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// The extractor used for ingestion
    pub fn extractor(&self) -> &Extractor<L> {
        &self.extractor
    }

    /// Ingest one source: acquire its text, extract records of `kind` and
    /// commit them as one batch
    ///
    /// Acquisition and extraction failures return before the store is
    /// touched.
    pub async fn ingest(
        &self,
        kind: RecordKind,
        source: Source,
    ) -> Result<BatchResult, IngestError> {
        info!(%kind, source = %source.describe(), "Ingestion started");

        let text = self.sources.acquire(&source).await?;
        let extraction = self.extractor.extract(&text, kind).await?;

        let coordinator = self.coordinator.clone();
        let records = extraction.records;
        let result = self
            .with_store(move |store| coordinator.commit_batch(store, kind, records))
            .await?;

        info!(
            %kind,
            inserted = result.inserted_records.len(),
            duplicates = result.duplicate_groups.len(),
            status = ?result.status(),
            "Ingestion finished"
        );
        Ok(result)
    }

    /// All stored records of `kind`, ordered by id
    pub async fn list(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, IngestError> {
        self.with_store(move |store| store.fetch_all(kind).map_err(IngestError::database))
            .await
    }

    /// Overwrite stored records from a replace payload
    ///
    /// The whole payload is validated before any write. Returns the number
    /// of updated records.
    pub async fn replace(&self, kind: RecordKind, payload: &Value) -> Result<usize, IngestError> {
        let entries = parse_replace_payload(kind, payload)?;
        let coordinator = self.coordinator.clone();
        self.with_store(move |store| coordinator.replace_batch(store, kind, entries))
            .await
    }

    /// Insert one client record without duplicate resolution
    pub async fn add(&self, kind: RecordKind, payload: &Value) -> Result<StoredRecord, IngestError> {
        let record = parse_add_payload(kind, payload)?;
        let coordinator = self.coordinator.clone();
        self.with_store(move |store| coordinator.add_entry(store, record))
            .await
    }

    /// Run `f` against the store on the blocking pool
    async fn with_store<T, F>(&self, f: F) -> Result<T, IngestError>
    where
        F: FnOnce(&mut S) -> Result<T, IngestError> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            // A panic mid-batch already rolled back through the batch scope
            let mut guard = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f(&mut *guard)
        })
        .await
        .map_err(|e| IngestError::Database(format!("store task failed: {}", e)))?
    }
}
