// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Audit trail — append-only SQLite log of every verification and publication.
//
// Schema:
//   audit_log(
//     id              INTEGER PRIMARY KEY AUTOINCREMENT,
//     timestamp       TEXT    NOT NULL,   -- RFC 3339
//     action          TEXT    NOT NULL,   -- e.g. "compare", "verify-ledger"
//     verification_id TEXT,               -- UUID of the request, if any
//     document_digest TEXT    NOT NULL,   -- 0x-prefixed SHA-256
//     success         INTEGER NOT NULL,   -- 0 = mismatch/failure, 1 = match/success
//     details         TEXT                -- optional free-form context
//   )

use std::fmt;
use std::path::Path;

use chrono::Utc;
use hashmark_core::error::HashmarkError;
use hashmark_core::types::{FileDigest, VerificationId};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS audit_log (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp       TEXT    NOT NULL,
    action          TEXT    NOT NULL,
    verification_id TEXT,
    document_digest TEXT    NOT NULL,
    success         INTEGER NOT NULL,
    details         TEXT
);
CREATE INDEX IF NOT EXISTS audit_log_digest ON audit_log (document_digest);";

/// Convert a `rusqlite::Error` into a `HashmarkError::Database`.
fn db_err(e: rusqlite::Error) -> HashmarkError {
    HashmarkError::Database(e.to_string())
}

/// Kind of operation being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Compare,
    VerifyStored,
    VerifyKnown,
    VerifyLedger,
    Publish,
    Revise,
    Retire,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compare => "compare",
            Self::VerifyStored => "verify-stored",
            Self::VerifyKnown => "verify-known",
            Self::VerifyLedger => "verify-ledger",
            Self::Publish => "publish",
            Self::Revise => "revise",
            Self::Retire => "retire",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the audit log, used for queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: String,
    pub action: String,
    pub verification_id: Option<String>,
    pub document_digest: String,
    pub success: bool,
    pub details: Option<String>,
}

/// Append-only audit log backed by a SQLite database.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database at `path` in WAL mode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HashmarkError> {
        let conn = Connection::open(path).map_err(db_err)?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("audit log opened");
        Ok(Self { conn })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self, HashmarkError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self { conn })
    }

    /// Record a new audit entry.
    #[instrument(skip(self, details), fields(%action, %digest, success))]
    pub fn record(
        &self,
        action: AuditAction,
        verification_id: Option<VerificationId>,
        digest: &FileDigest,
        success: bool,
        details: Option<&str>,
    ) -> Result<(), HashmarkError> {
        let timestamp = Utc::now().to_rfc3339();
        let success_int: i32 = if success { 1 } else { 0 };

        self.conn
            .execute(
                "INSERT INTO audit_log (timestamp, action, verification_id, document_digest, success, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    timestamp,
                    action.as_str(),
                    verification_id.map(|v| v.to_string()),
                    digest.to_hex(),
                    success_int,
                    details
                ],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// All entries for a digest, oldest first.
    pub fn entries_for_digest(&self, digest: &FileDigest) -> Result<Vec<AuditEntry>, HashmarkError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, verification_id, document_digest, success, details
                 FROM audit_log
                 WHERE document_digest = ?1
                 ORDER BY id ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![digest.to_hex()], row_to_entry)
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    /// The most recent `limit` entries, newest first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditEntry>, HashmarkError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, action, verification_id, document_digest, success, details
                 FROM audit_log
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt.query_map(params![limit], row_to_entry).map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    pub fn count(&self) -> Result<u64, HashmarkError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
            .map_err(db_err)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        action: row.get(2)?,
        verification_id: row.get(3)?,
        document_digest: row.get(4)?,
        success: row.get::<_, i32>(5)? != 0,
        details: row.get(6)?,
    })
}
