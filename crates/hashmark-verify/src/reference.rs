// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reference store — fingerprints kept locally to verify later copies against.
//
// Only metadata and the digest are stored, never the document bytes.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{FileDigest, FileRecord, ReferenceId};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS reference_records (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL,
        file_name TEXT NOT NULL,
        size INTEGER NOT NULL,
        media_type TEXT,
        digest TEXT NOT NULL,
        last_modified TEXT NOT NULL,
        stored_at TEXT NOT NULL
    )
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, label, file_name, size, media_type, digest, last_modified, stored_at FROM reference_records";

/// A stored fingerprint plus a human label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: ReferenceId,
    pub label: String,
    pub record: FileRecord,
    pub stored_at: DateTime<Utc>,
}

/// Where stored references come from.
pub trait ReferenceSource: Send + Sync {
    /// Load one reference. Missing records and storage failures are both
    /// `ReferenceUnavailable`: either way there is nothing to compare with.
    fn load(&self, id: ReferenceId) -> impl Future<Output = Result<ReferenceRecord>> + Send;
}

/// SQLite-backed reference store.
pub struct ReferenceStore {
    conn: Arc<Mutex<Connection>>,
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> HashmarkError + '_ {
    move |e| HashmarkError::Database(format!("{context}: {e}"))
}

fn conversion_err<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_time(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(column, e))
}

/// Map a row selected with `SELECT_COLUMNS`.
fn row_to_reference(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceRecord> {
    let id: String = row.get(0)?;
    let digest: String = row.get(5)?;
    let last_modified: String = row.get(6)?;
    let stored_at: String = row.get(7)?;

    let id = uuid::Uuid::parse_str(&id).map_err(|e| conversion_err(0, e))?;
    let digest = FileDigest::parse(&digest).map_err(|e| conversion_err(5, e))?;

    Ok(ReferenceRecord {
        id: ReferenceId(id),
        label: row.get(1)?,
        record: FileRecord {
            name: row.get(2)?,
            size: row.get::<_, i64>(3)? as u64,
            media_type: row.get(4)?,
            digest,
            last_modified: parse_time(6, &last_modified)?,
        },
        stored_at: parse_time(7, &stored_at)?,
    })
}

impl ReferenceStore {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        info!("reference store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        debug!("in-memory reference store opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| HashmarkError::Database("reference store poisoned".into()))
    }

    /// Store `record` under a fresh id.
    #[instrument(skip(self, record), fields(file = %record.name, digest = %record.digest))]
    pub fn insert(&self, label: &str, record: FileRecord) -> Result<ReferenceRecord> {
        let reference = ReferenceRecord {
            id: ReferenceId::new(),
            label: label.to_owned(),
            record,
            stored_at: Utc::now(),
        };

        self.conn()?
            .execute(
                "INSERT INTO reference_records
                 (id, label, file_name, size, media_type, digest, last_modified, stored_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    reference.id.to_string(),
                    reference.label,
                    reference.record.name,
                    reference.record.size as i64,
                    reference.record.media_type,
                    reference.record.digest.to_hex(),
                    reference.record.last_modified.to_rfc3339(),
                    reference.stored_at.to_rfc3339(),
                ],
            )
            .map_err(db_err("insert reference"))?;

        info!(id = %reference.id, "reference stored");
        Ok(reference)
    }

    /// `None` if there is no such reference.
    pub fn get(&self, id: ReferenceId) -> Result<Option<ReferenceRecord>> {
        fetch(&*self.conn()?, id)
    }

    /// All references, newest first.
    pub fn list(&self) -> Result<Vec<ReferenceRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY stored_at DESC"))
            .map_err(db_err("prepare list"))?;
        let references = stmt
            .query_map([], row_to_reference)
            .map_err(db_err("query list"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err("collect rows"))?;

        debug!(count = references.len(), "references listed");
        Ok(references)
    }

    /// Remove a reference. Removing one that does not exist is not an error.
    #[instrument(skip(self))]
    pub fn delete(&self, id: ReferenceId) -> Result<()> {
        let removed = self
            .conn()?
            .execute(
                "DELETE FROM reference_records WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(db_err("delete reference"))?;

        info!(removed, "reference deleted");
        Ok(())
    }
}

fn fetch(conn: &Connection, id: ReferenceId) -> Result<Option<ReferenceRecord>> {
    let reference = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.to_string()],
            row_to_reference,
        )
        .optional()
        .map_err(db_err("get reference"))?;
    Ok(reference)
}

impl ReferenceSource for ReferenceStore {
    /// Runs on the blocking pool so a locked database never stalls the
    /// runtime.
    async fn load(&self, id: ReferenceId) -> Result<ReferenceRecord> {
        let conn = Arc::clone(&self.conn);
        let found = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| HashmarkError::Database("reference store poisoned".into()))?;
            fetch(&conn, id)
        })
        .await
        .map_err(|err| HashmarkError::ReferenceUnavailable(format!("lookup task failed: {err}")))?;

        match found {
            Ok(Some(reference)) => Ok(reference),
            Ok(None) => Err(HashmarkError::ReferenceUnavailable(format!(
                "no reference with id {id}"
            ))),
            Err(err) => Err(HashmarkError::ReferenceUnavailable(err.to_string())),
        }
    }
}
