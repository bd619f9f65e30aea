// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local development ledger backed by SQLite.
//
// Same semantics as the contract: 1-based ids, owner-only writes, digest
// lookups over active documents. Rows are read back through the contract
// boundary so stored values get the same validation as chain responses.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info, instrument};

use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{
    Claim, DocumentEntry, DocumentId, DocumentUpdate, FileDigest, LedgerDocument, OwnerAddress,
};

use crate::boundary::{BatchArgs, RawDocument, UpdateArgs};
use crate::gateway::{LedgerGateway, Page};

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        file_name TEXT NOT NULL,
        digest TEXT NOT NULL,
        owner TEXT NOT NULL,
        status INTEGER NOT NULL DEFAULT 1,
        recorded_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_documents_digest ON documents(digest);
    CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner);
"#;

/// Ledger stored in a single SQLite file.
///
/// rusqlite is synchronous, so every call runs on tokio's blocking pool
/// against a shared connection. A caller's timeout can then fire while a
/// statement is still waiting on a locked database.
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

fn db_err(context: &str) -> impl Fn(rusqlite::Error) -> HashmarkError + '_ {
    move |e| HashmarkError::Database(format!("{context}: {e}"))
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err("open"))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err("WAL pragma"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        info!("ledger database opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory ledger (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err("open in-memory"))?;
        conn.execute_batch(CREATE_TABLE_SQL)
            .map_err(db_err("create table"))?;

        debug!("in-memory ledger opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `call` on the blocking pool with the connection locked.
    async fn blocking<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| HashmarkError::Database("ledger connection poisoned".into()))?;
            call(&mut *conn)
        })
        .await
        .map_err(|err| HashmarkError::LedgerUnavailable(format!("{op} task failed: {err}")))?
    }
}

fn query_ids(conn: &Connection, sql: &str, param: &str) -> Result<Vec<DocumentId>> {
    let mut stmt = conn.prepare(sql).map_err(db_err("prepare id query"))?;
    let ids = stmt
        .query_map(params![param], |row| row.get::<_, i64>(0))
        .map_err(db_err("query ids"))?
        .map(|id| id.map(|id| DocumentId(id as u64)))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err("collect ids"))?;
    Ok(ids)
}

/// Owner of `id`, or `LedgerRejected` if there is no such document.
fn owner_of(conn: &Connection, id: DocumentId) -> Result<OwnerAddress> {
    let owner: Option<String> = conn
        .query_row(
            "SELECT owner FROM documents WHERE id = ?1",
            params![id.0 as i64],
            |row| row.get(0),
        )
        .optional()
        .map_err(db_err("read owner"))?;

    let owner = owner
        .ok_or_else(|| HashmarkError::LedgerRejected(format!("document {id} does not exist")))?;
    OwnerAddress::parse(&owner)
        .map_err(|err| HashmarkError::LedgerResponse(format!("document {id}: {err}")))
}

fn ensure_owner(conn: &Connection, caller: &OwnerAddress, id: DocumentId) -> Result<()> {
    if owner_of(conn, id)? != *caller {
        return Err(HashmarkError::Unauthorized);
    }
    Ok(())
}

fn insert(conn: &Connection, owner: &OwnerAddress, entry: &DocumentEntry) -> rusqlite::Result<DocumentId> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (name, file_name, digest, owner, status, recorded_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
        params![
            entry.name,
            entry.file_name,
            entry.digest.to_hex(),
            owner.as_str(),
            now
        ],
    )?;
    Ok(DocumentId(conn.last_insert_rowid() as u64))
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
    Ok(RawDocument {
        name: row.get(0)?,
        file_name: row.get(1)?,
        document_hash: row.get(2)?,
        owner: row.get(3)?,
        status: row.get::<_, i64>(4)? != 0,
    })
}

impl LedgerGateway for SqliteLedger {
    async fn lookup_ids_by_digest(&self, digest: &FileDigest) -> Result<Vec<DocumentId>> {
        let digest = digest.to_hex();
        self.blocking("lookup_ids_by_digest", move |conn| {
            query_ids(
                conn,
                "SELECT id FROM documents WHERE digest = ?1 AND status = 1 ORDER BY id",
                &digest,
            )
        })
        .await
    }

    async fn read_by_id(&self, id: DocumentId) -> Result<LedgerDocument> {
        let raw = self
            .blocking("read_by_id", move |conn| {
                conn.query_row(
                    "SELECT name, file_name, digest, owner, status FROM documents WHERE id = ?1",
                    params![id.0 as i64],
                    row_to_raw,
                )
                .optional()
                .map_err(db_err("read document"))
            })
            .await?;

        raw.ok_or_else(|| HashmarkError::LedgerRejected(format!("document {id} does not exist")))?
            .parse(id)
    }

    async fn list_ids_by_owner(&self, owner: &OwnerAddress) -> Result<Vec<DocumentId>> {
        let owner = owner.clone();
        self.blocking("list_ids_by_owner", move |conn| {
            query_ids(
                conn,
                "SELECT id FROM documents WHERE owner = ?1 ORDER BY id",
                owner.as_str(),
            )
        })
        .await
    }

    async fn paginate(&self, page: u32, page_size: u32, ids: &[DocumentId]) -> Result<Page> {
        Page::window(page, page_size, ids)
    }

    async fn total_slots(&self) -> Result<u64> {
        self.blocking("total_slots", |conn| {
            let count: i64 = conn
                .query_row("SELECT COALESCE(MAX(id), 0) FROM documents", [], |row| row.get(0))
                .map_err(db_err("count slots"))?;
            Ok(count as u64)
        })
        .await
    }

    #[instrument(skip(self, caller, entry), fields(owner = %caller.owner, file = %entry.file_name))]
    async fn write(&self, caller: &Claim, entry: DocumentEntry) -> Result<DocumentId> {
        let owner = caller.owner.clone();
        let id = self
            .blocking("write", move |conn| {
                insert(conn, &owner, &entry).map_err(db_err("insert document"))
            })
            .await?;
        info!(%id, "document written");
        Ok(id)
    }

    #[instrument(skip(self, caller, entries), fields(owner = %caller.owner, count = entries.len()))]
    async fn batch_write(&self, caller: &Claim, entries: Vec<DocumentEntry>) -> Result<Vec<DocumentId>> {
        let entries = BatchArgs::encode(&entries).into_entries()?;
        let owner = caller.owner.clone();
        let ids = self
            .blocking("batch_write", move |conn| {
                let tx = conn.transaction().map_err(db_err("begin batch"))?;
                let mut ids = Vec::with_capacity(entries.len());
                for entry in &entries {
                    ids.push(insert(&tx, &owner, entry).map_err(db_err("insert batch member"))?);
                }
                tx.commit().map_err(db_err("commit batch"))?;
                Ok(ids)
            })
            .await?;

        info!(count = ids.len(), "batch written");
        Ok(ids)
    }

    #[instrument(skip(self, caller, update), fields(owner = %caller.owner))]
    async fn update(&self, caller: &Claim, id: DocumentId, update: DocumentUpdate) -> Result<()> {
        let args = UpdateArgs::encode(id, &update);
        let owner = caller.owner.clone();
        self.blocking("update", move |conn| {
            ensure_owner(conn, &owner, id)?;

            // Empty strings and the zero hash mean "leave as is".
            conn.execute(
                "UPDATE documents SET
                    name = CASE WHEN ?1 = '' THEN name ELSE ?1 END,
                    file_name = CASE WHEN ?2 = '' THEN file_name ELSE ?2 END,
                    digest = CASE WHEN ?3 = ?4 THEN digest ELSE ?3 END,
                    updated_at = ?5
                 WHERE id = ?6",
                params![
                    args.name,
                    args.file_name,
                    args.new_hash.to_hex(),
                    FileDigest::ZERO.to_hex(),
                    Utc::now().to_rfc3339(),
                    id.0 as i64
                ],
            )
            .map_err(db_err("update document"))?;
            Ok(())
        })
        .await?;

        info!("document updated");
        Ok(())
    }

    #[instrument(skip(self, caller), fields(owner = %caller.owner))]
    async fn change_status(&self, caller: &Claim, id: DocumentId, active: bool) -> Result<()> {
        let owner = caller.owner.clone();
        self.blocking("change_status", move |conn| {
            ensure_owner(conn, &owner, id)?;
            conn.execute(
                "UPDATE documents SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![active as i64, Utc::now().to_rfc3339(), id.0 as i64],
            )
            .map_err(db_err("change status"))?;
            Ok(())
        })
        .await?;

        info!("document status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(n: u8) -> Claim {
        Claim::for_owner(OwnerAddress::parse(&format!("0x{}", format!("{n:02x}").repeat(20))).expect("address"))
    }

    fn entry(file_name: &str, fill: u8) -> DocumentEntry {
        DocumentEntry {
            name: "Biên bản".into(),
            file_name: file_name.into(),
            digest: FileDigest::from_bytes([fill; 32]),
        }
    }

    #[tokio::test]
    async fn write_and_read_back() {
        let ledger = SqliteLedger::open_in_memory().expect("open");
        let alice = claim(1);
        let id = ledger.write(&alice, entry("a.pdf", 5)).await.expect("write");
        assert_eq!(id, DocumentId(1));

        let doc = ledger.read_by_id(id).await.expect("read");
        assert_eq!(doc.name, "Biên bản");
        assert_eq!(doc.file_name, "a.pdf");
        assert_eq!(doc.owner, alice.owner);
        assert!(doc.is_active());
    }

    #[tokio::test]
    async fn lookup_ignores_retired() {
        let ledger = SqliteLedger::open_in_memory().expect("open");
        let alice = claim(1);
        let digest = FileDigest::from_bytes([5; 32]);
        let first = ledger.write(&alice, entry("a.pdf", 5)).await.unwrap();
        let second = ledger.write(&alice, entry("b.pdf", 5)).await.unwrap();

        ledger.change_status(&alice, first, false).await.unwrap();
        assert_eq!(ledger.lookup_ids_by_digest(&digest).await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn update_uses_sentinels() {
        let ledger = SqliteLedger::open_in_memory().expect("open");
        let alice = claim(1);
        let id = ledger.write(&alice, entry("a.pdf", 5)).await.unwrap();

        let revised = DocumentUpdate {
            name: None,
            file_name: Some("a-v2.pdf".into()),
            digest: Some(FileDigest::from_bytes([6; 32])),
        };
        ledger.update(&alice, id, revised).await.unwrap();

        let doc = ledger.read_by_id(id).await.unwrap();
        assert_eq!(doc.name, "Biên bản");
        assert_eq!(doc.file_name, "a-v2.pdf");
        assert_eq!(doc.digest, FileDigest::from_bytes([6; 32]));
    }

    #[tokio::test]
    async fn strangers_cannot_update() {
        let ledger = SqliteLedger::open_in_memory().expect("open");
        let id = ledger.write(&claim(1), entry("a.pdf", 5)).await.unwrap();
        assert!(matches!(
            ledger.change_status(&claim(2), id, false).await,
            Err(HashmarkError::Unauthorized)
        ));
        assert!(matches!(
            ledger.update(&claim(2), DocumentId(42), DocumentUpdate::default()).await,
            Err(HashmarkError::LedgerRejected(_))
        ));
    }

    #[tokio::test]
    async fn batch_and_owner_listing() {
        let ledger = SqliteLedger::open_in_memory().expect("open");
        let alice = claim(1);
        let ids = ledger
            .batch_write(&alice, vec![entry("a.pdf", 1), entry("b.pdf", 2), entry("c.pdf", 3)])
            .await
            .unwrap();
        assert_eq!(ids, vec![DocumentId(1), DocumentId(2), DocumentId(3)]);
        ledger.write(&claim(2), entry("d.pdf", 4)).await.unwrap();

        assert_eq!(ledger.list_ids_by_owner(&alice.owner).await.unwrap(), ids);
        assert_eq!(ledger.total_slots().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ledger.db");
        {
            let ledger = SqliteLedger::open(&path).expect("open");
            ledger.write(&claim(1), entry("a.pdf", 5)).await.unwrap();
        }
        let ledger = SqliteLedger::open(&path).expect("reopen");
        assert_eq!(ledger.total_slots().await.unwrap(), 1);
        assert_eq!(ledger.read_by_id(DocumentId(1)).await.unwrap().file_name, "a.pdf");
    }

    #[tokio::test]
    async fn locked_database_times_out_instead_of_blocking() {
        use std::time::{Duration, Instant};

        use crate::retry::{ResilientLedger, RetryConfig};

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ledger.db");
        let retry = RetryConfig {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };
        let ledger = ResilientLedger::new(
            SqliteLedger::open(&path).expect("open"),
            retry,
            Duration::from_millis(50),
        );

        let holder = Connection::open(&path).expect("second connection");
        holder.execute_batch("BEGIN EXCLUSIVE").expect("lock");

        let started = Instant::now();
        let result = ledger.write(&claim(1), entry("a.pdf", 5)).await;
        let elapsed = started.elapsed();

        match result {
            Err(HashmarkError::LedgerUnavailable(detail)) => assert!(detail.contains("timed out"), "{detail}"),
            other => panic!("expected a timeout, got {other:?}"),
        }
        assert!(elapsed < Duration::from_secs(1), "took {elapsed:?}");

        // Let the abandoned insert finish so the runtime can shut down.
        holder.execute_batch("ROLLBACK").expect("unlock");
    }
}
