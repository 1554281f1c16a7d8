//! Annuaire Storage Layer
//!
//! Implements the `RecordStore` trait on SQLite.
//!
//! # Architecture
//!
//! - One table per record kind, created from the static schema
//! - Fixed parameterized statements per kind (see [`schema`])
//! - A `similarity(a, b)` SQL function backed by the same trigram scoring
//!   the resolver uses, so candidate lookup happens in SQL
//! - Explicit `BEGIN`/`COMMIT`/`ROLLBACK` driven by the pipeline's batch scope
//!
//! # Examples
//!
//! ```
//! use annuaire_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! assert!(!store.in_transaction());
//! ```

#![warn(missing_docs)]

pub mod schema;

use annuaire_domain::similarity::similarity;
use annuaire_domain::traits::RecordStore;
use annuaire_domain::{FieldType, FieldValue, Record, RecordId, RecordKind, StoredRecord};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Params};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No row with this id
    #[error("{kind} entry {id} not found")]
    NotFound {
        /// Table searched
        kind: RecordKind,
        /// Missing id
        id: RecordId,
    },

    /// A stored row does not fit the schema
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of `RecordStore`
///
/// # Thread Safety
///
/// A SQLite connection is not `Sync`. The server shares one store behind a
/// mutex; the CLI owns its own.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Fresh in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        register_similarity(&conn)?;
        conn.execute_batch(&schema::create_all())?;
        Ok(Self { conn })
    }

    /// Whether a transaction is open on this connection
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Fetch one record by id
    pub fn get(&self, kind: RecordKind, id: RecordId) -> Result<Option<StoredRecord>, StoreError> {
        let row = self
            .conn
            .query_row(&schema::select_by_id(kind), params![id.value()], |row| {
                read_row(kind, row)
            })
            .optional()?;
        row.map(|(id, values)| to_stored(kind, id, values)).transpose()
    }

    /// Number of stored records of a kind
    pub fn count(&self, kind: RecordKind) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_records<P: Params>(
        &self,
        kind: RecordKind,
        sql: &str,
        params: P,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| read_row(kind, row))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, values) = row?;
            records.push(to_stored(kind, id, values)?);
        }
        Ok(records)
    }
}

fn register_similarity(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "similarity",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a: Option<String> = ctx.get(0)?;
            let b: Option<String> = ctx.get(1)?;
            Ok(match (a, b) {
                (Some(a), Some(b)) => similarity(&a, &b),
                _ => 0.0,
            })
        },
    )
}

fn read_row(kind: RecordKind, row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, Vec<FieldValue>)> {
    let id: i64 = row.get(0)?;
    let mut values = Vec::with_capacity(kind.fields().len());
    for (i, def) in kind.fields().iter().enumerate() {
        let raw: SqlValue = row.get(i + 1)?;
        values.push(from_sql(raw, def.ty));
    }
    Ok((id, values))
}

fn to_stored(kind: RecordKind, id: i64, values: Vec<FieldValue>) -> Result<StoredRecord, StoreError> {
    let record = Record::from_values(kind, values)
        .map_err(|e| StoreError::InvalidData(format!("{} entry {}: {}", kind, id, e)))?;
    Ok(StoredRecord::new(RecordId(id), record))
}

fn to_sql(value: FieldValue) -> SqlValue {
    match value {
        FieldValue::Null => SqlValue::Null,
        FieldValue::Text(s) => SqlValue::Text(s),
        FieldValue::Integer(i) => SqlValue::Integer(i),
        FieldValue::Float(f) => SqlValue::Real(f),
        FieldValue::Bool(b) => SqlValue::Integer(i64::from(b)),
    }
}

fn from_sql(value: SqlValue, ty: FieldType) -> FieldValue {
    let text_typed = matches!(ty, FieldType::Text | FieldType::Date | FieldType::Time);
    match value {
        SqlValue::Null => FieldValue::Null,
        SqlValue::Integer(i) if text_typed => FieldValue::Text(i.to_string()),
        SqlValue::Integer(i) => FieldValue::Integer(i),
        SqlValue::Real(f) if text_typed => FieldValue::Text(f.to_string()),
        SqlValue::Real(f) => FieldValue::Float(f),
        SqlValue::Text(s) if text_typed => FieldValue::Text(s),
        // Rows written by other tools may hold numbers as text
        SqlValue::Text(s) => {
            FieldValue::coerce(&serde_json::Value::String(s.clone()), ty)
                .unwrap_or(FieldValue::Text(s))
        }
        SqlValue::Blob(bytes) => FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

impl RecordStore for SqliteStore {
    type Error = StoreError;

    fn fetch_all(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, Self::Error> {
        self.query_records(kind, &schema::select_all(kind), [])
    }

    fn find_similar(
        &self,
        kind: RecordKind,
        primary: &str,
        secondary: &str,
        threshold: f64,
    ) -> Result<Vec<StoredRecord>, Self::Error> {
        self.query_records(
            kind,
            &schema::select_similar(kind),
            params![primary, threshold, secondary],
        )
    }

    fn insert(&mut self, record: &Record) -> Result<RecordId, Self::Error> {
        let kind = record.kind();
        let values = record.values().into_iter().map(to_sql);
        self.conn
            .execute(&schema::insert(kind), params_from_iter(values))?;
        let id = RecordId(self.conn.last_insert_rowid());
        tracing::debug!(%kind, %id, "inserted record");
        Ok(id)
    }

    fn update(&mut self, id: RecordId, record: &Record) -> Result<(), Self::Error> {
        let kind = record.kind();
        let values = record
            .values()
            .into_iter()
            .map(to_sql)
            .chain(std::iter::once(SqlValue::Integer(id.value())));
        let changed = self
            .conn
            .execute(&schema::update(kind), params_from_iter(values))?;
        if changed == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        tracing::debug!(%kind, %id, "updated record");
        Ok(())
    }

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
