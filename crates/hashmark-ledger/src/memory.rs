// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory ledger with the contract's semantics.
//
// Used by tests and by anything that wants a ledger without a chain. It can
// also simulate a flaky node (injected failures and latency) so retry and
// timeout handling can be exercised deterministically.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{
    Claim, DocumentEntry, DocumentId, DocumentUpdate, FileDigest, LedgerDocument, OwnerAddress,
};
use tracing::{debug, info};

use crate::boundary::{BatchArgs, UpdateArgs};
use crate::gateway::{LedgerGateway, Page};

#[derive(Debug, Default)]
struct Faults {
    /// Calls still to fail with a transient error.
    failures_left: u32,
    /// Delay added to every call.
    latency: Option<Duration>,
    /// Calls seen so far, failed ones included.
    calls: u64,
}

/// In-memory document ledger. Document `n` lives at index `n - 1`.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    documents: Mutex<Vec<LedgerDocument>>,
    faults: Mutex<Faults>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls with a transient `LedgerUnavailable`.
    pub fn fail_next(&self, count: u32) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.failures_left = count;
        }
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.latency = latency;
        }
    }

    /// Number of gateway calls made so far.
    pub fn calls(&self) -> u64 {
        self.faults.lock().map(|f| f.calls).unwrap_or(0)
    }

    async fn enter(&self) -> Result<()> {
        let (latency, fail) = {
            let mut faults = self
                .faults
                .lock()
                .map_err(|_| HashmarkError::LedgerUnavailable("fault state poisoned".into()))?;
            faults.calls += 1;
            let fail = faults.failures_left > 0;
            if fail {
                faults.failures_left -= 1;
            }
            (faults.latency, fail)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            debug!("injected ledger failure");
            return Err(HashmarkError::LedgerUnavailable(
                "connection refused (simulated)".into(),
            ));
        }
        Ok(())
    }

    fn documents(&self) -> Result<MutexGuard<'_, Vec<LedgerDocument>>> {
        self.documents
            .lock()
            .map_err(|_| HashmarkError::LedgerUnavailable("ledger state poisoned".into()))
    }
}

/// Index into the document list for `id`, or `LedgerRejected`.
fn slot(documents: &[LedgerDocument], id: DocumentId) -> Result<usize> {
    let index = (id.0 as usize).checked_sub(1);
    match index {
        Some(i) if i < documents.len() => Ok(i),
        _ => Err(HashmarkError::LedgerRejected(format!(
            "document {id} does not exist"
        ))),
    }
}

fn owned_slot(documents: &[LedgerDocument], caller: &Claim, id: DocumentId) -> Result<usize> {
    let index = slot(documents, id)?;
    if documents[index].owner != caller.owner {
        return Err(HashmarkError::Unauthorized);
    }
    Ok(index)
}

fn append(documents: &mut Vec<LedgerDocument>, owner: &OwnerAddress, entry: DocumentEntry) -> DocumentId {
    let id = DocumentId(documents.len() as u64 + 1);
    documents.push(LedgerDocument {
        id,
        name: entry.name,
        file_name: entry.file_name,
        digest: entry.digest,
        owner: owner.clone(),
        status: true,
    });
    id
}

impl LedgerGateway for MemoryLedger {
    async fn lookup_ids_by_digest(&self, digest: &FileDigest) -> Result<Vec<DocumentId>> {
        self.enter().await?;
        let documents = self.documents()?;
        Ok(documents
            .iter()
            .filter(|doc| doc.is_active() && doc.digest == *digest)
            .map(|doc| doc.id)
            .collect())
    }

    async fn read_by_id(&self, id: DocumentId) -> Result<LedgerDocument> {
        self.enter().await?;
        let documents = self.documents()?;
        let index = slot(&documents, id)?;
        Ok(documents[index].clone())
    }

    async fn list_ids_by_owner(&self, owner: &OwnerAddress) -> Result<Vec<DocumentId>> {
        self.enter().await?;
        let documents = self.documents()?;
        Ok(documents
            .iter()
            .filter(|doc| doc.owner == *owner)
            .map(|doc| doc.id)
            .collect())
    }

    async fn paginate(&self, page: u32, page_size: u32, ids: &[DocumentId]) -> Result<Page> {
        self.enter().await?;
        Page::window(page, page_size, ids)
    }

    async fn total_slots(&self) -> Result<u64> {
        self.enter().await?;
        Ok(self.documents()?.len() as u64)
    }

    async fn write(&self, caller: &Claim, entry: DocumentEntry) -> Result<DocumentId> {
        self.enter().await?;
        let mut documents = self.documents()?;
        let id = append(&mut documents, &caller.owner, entry);
        info!(%id, owner = %caller.owner, "document written");
        Ok(id)
    }

    async fn batch_write(&self, caller: &Claim, entries: Vec<DocumentEntry>) -> Result<Vec<DocumentId>> {
        self.enter().await?;
        let entries = BatchArgs::encode(&entries).into_entries()?;
        let mut documents = self.documents()?;
        let ids: Vec<_> = entries
            .into_iter()
            .map(|entry| append(&mut documents, &caller.owner, entry))
            .collect();
        info!(count = ids.len(), owner = %caller.owner, "batch written");
        Ok(ids)
    }

    async fn update(&self, caller: &Claim, id: DocumentId, update: DocumentUpdate) -> Result<()> {
        self.enter().await?;
        let (id, update) = UpdateArgs::encode(id, &update).decode();
        let mut documents = self.documents()?;
        let index = owned_slot(&documents, caller, id)?;

        let doc = &mut documents[index];
        if let Some(name) = update.name {
            doc.name = name;
        }
        if let Some(file_name) = update.file_name {
            doc.file_name = file_name;
        }
        if let Some(digest) = update.digest {
            doc.digest = digest;
        }
        info!(%id, "document updated");
        Ok(())
    }

    async fn change_status(&self, caller: &Claim, id: DocumentId, active: bool) -> Result<()> {
        self.enter().await?;
        let mut documents = self.documents()?;
        let index = owned_slot(&documents, caller, id)?;
        documents[index].status = active;
        info!(%id, active, "document status changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(n: u8) -> Claim {
        Claim::for_owner(OwnerAddress::parse(&format!("0x{}", format!("{n:02x}").repeat(20))).expect("address"))
    }

    fn entry(file_name: &str, fill: u8) -> DocumentEntry {
        DocumentEntry {
            name: "Record".into(),
            file_name: file_name.into(),
            digest: FileDigest::from_bytes([fill; 32]),
        }
    }

    #[tokio::test]
    async fn ids_start_at_one() {
        let ledger = MemoryLedger::new();
        let alice = owner(1);
        assert_eq!(ledger.write(&alice, entry("a.pdf", 1)).await.unwrap(), DocumentId(1));
        assert_eq!(ledger.write(&alice, entry("b.pdf", 2)).await.unwrap(), DocumentId(2));
        assert_eq!(ledger.total_slots().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lookup_finds_every_active_copy() {
        let ledger = MemoryLedger::new();
        let alice = owner(1);
        let bob = owner(2);
        ledger.write(&alice, entry("a.pdf", 7)).await.unwrap();
        ledger.write(&bob, entry("a-copy.pdf", 7)).await.unwrap();
        ledger.write(&bob, entry("other.pdf", 8)).await.unwrap();

        let ids = ledger
            .lookup_ids_by_digest(&FileDigest::from_bytes([7; 32]))
            .await
            .unwrap();
        assert_eq!(ids, vec![DocumentId(1), DocumentId(2)]);

        let none = ledger
            .lookup_ids_by_digest(&FileDigest::from_bytes([9; 32]))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn retired_documents_drop_out_of_lookup() {
        let ledger = MemoryLedger::new();
        let alice = owner(1);
        let id = ledger.write(&alice, entry("a.pdf", 7)).await.unwrap();
        ledger.change_status(&alice, id, false).await.unwrap();

        let digest = FileDigest::from_bytes([7; 32]);
        assert!(ledger.lookup_ids_by_digest(&digest).await.unwrap().is_empty());
        assert!(!ledger.read_by_id(id).await.unwrap().is_active());

        ledger.change_status(&alice, id, true).await.unwrap();
        assert_eq!(ledger.lookup_ids_by_digest(&digest).await.unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn only_the_owner_may_change_a_document() {
        let ledger = MemoryLedger::new();
        let alice = owner(1);
        let mallory = owner(3);
        let id = ledger.write(&alice, entry("a.pdf", 1)).await.unwrap();

        let update = DocumentUpdate {
            name: Some("Hijacked".into()),
            ..Default::default()
        };
        assert!(matches!(
            ledger.update(&mallory, id, update).await,
            Err(HashmarkError::Unauthorized)
        ));
        assert!(matches!(
            ledger.change_status(&mallory, id, false).await,
            Err(HashmarkError::Unauthorized)
        ));
        assert_eq!(ledger.read_by_id(id).await.unwrap().name, "Record");
    }

    #[tokio::test]
    async fn update_leaves_unset_fields_alone() {
        let ledger = MemoryLedger::new();
        let alice = owner(1);
        let id = ledger.write(&alice, entry("a.pdf", 1)).await.unwrap();

        let update = DocumentUpdate {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        ledger.update(&alice, id, update).await.unwrap();

        let doc = ledger.read_by_id(id).await.unwrap();
        assert_eq!(doc.name, "Renamed");
        assert_eq!(doc.file_name, "a.pdf");
        assert_eq!(doc.digest, FileDigest::from_bytes([1; 32]));
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.read_by_id(DocumentId(0)).await,
            Err(HashmarkError::LedgerRejected(_))
        ));
        assert!(ledger.read_by_id(DocumentId(1)).await.is_err());
    }

    #[tokio::test]
    async fn owner_listing_and_pagination() {
        let ledger = MemoryLedger::new();
        let alice = owner(1);
        let bob = owner(2);
        let batch: Vec<_> = (0..12).map(|i| entry(&format!("{i}.pdf"), i)).collect();
        ledger.batch_write(&alice, batch).await.unwrap();
        ledger.write(&bob, entry("bob.pdf", 99)).await.unwrap();

        let ids = ledger.list_ids_by_owner(&alice.owner).await.unwrap();
        assert_eq!(ids.len(), 12);

        let page = ledger.paginate(2, 10, &ids).await.unwrap();
        assert_eq!(page.ids, vec![DocumentId(11), DocumentId(12)]);
        assert_eq!(page.total, 12);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let ledger = MemoryLedger::new();
        ledger.fail_next(2);
        assert!(ledger.total_slots().await.is_err());
        assert!(ledger.total_slots().await.is_err());
        assert_eq!(ledger.total_slots().await.unwrap(), 0);
        assert_eq!(ledger.calls(), 3);
    }
}
