// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Catalogue — paged, resolved views over lists of ledger ids.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use hashmark_core::error::Result;
use hashmark_core::types::{DocumentId, LedgerDocument, OwnerAddress};
use hashmark_ledger::{DEFAULT_PAGE_SIZE, LedgerGateway, Page};

use crate::orchestrator::UnresolvedDocument;

/// One page of documents, ready to show in a table.
#[derive(Debug, Clone, Serialize)]
pub struct CataloguePage {
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
    pub documents: Vec<LedgerDocument>,
    pub unresolved: Vec<UnresolvedDocument>,
}

pub struct Catalogue<L> {
    ledger: Arc<L>,
    page_size: u32,
}

impl<L: LedgerGateway> Catalogue<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_page_size(ledger, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(ledger: Arc<L>, page_size: u32) -> Self {
        Self { ledger, page_size }
    }

    /// Page `page` of everything `owner` has published.
    #[instrument(skip(self))]
    pub async fn owner_page(&self, owner: &OwnerAddress, page: u32) -> Result<CataloguePage> {
        let ids = self.ledger.list_ids_by_owner(owner).await?;
        debug!(count = ids.len(), "owner documents listed");
        self.page_of(&ids, page).await
    }

    /// Page `page` of an arbitrary id list, e.g. the matches of a lookup.
    pub async fn page_of(&self, ids: &[DocumentId], page: u32) -> Result<CataloguePage> {
        let Page { ids: window, total } = self.ledger.paginate(page, self.page_size, ids).await?;

        let mut documents = Vec::with_capacity(window.len());
        let mut unresolved = Vec::new();
        for id in window {
            match self.ledger.read_by_id(id).await {
                Ok(document) => documents.push(document),
                Err(err) => {
                    warn!(%id, %err, "document could not be read");
                    unresolved.push(UnresolvedDocument {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(CataloguePage {
            page,
            page_size: self.page_size,
            total,
            total_pages: Page::count_pages(total, self.page_size),
            documents,
            unresolved,
        })
    }
}

#[cfg(test)]
mod tests {
    use hashmark_core::error::HashmarkError;
    use hashmark_core::types::{Claim, DocumentEntry, FileDigest};
    use hashmark_ledger::MemoryLedger;

    use super::*;

    fn claim(byte: &str) -> Claim {
        Claim::for_owner(OwnerAddress::parse(&format!("0x{}", byte.repeat(20))).expect("address"))
    }

    async fn seeded(count: u8) -> (Arc<MemoryLedger>, Claim) {
        let ledger = Arc::new(MemoryLedger::new());
        let owner = claim("aa");
        for i in 0..count {
            let entry = DocumentEntry {
                name: format!("Record {i}"),
                file_name: format!("{i}.pdf"),
                digest: FileDigest::from_bytes([i; 32]),
            };
            ledger.write(&owner, entry).await.expect("write");
        }
        ledger.write(&claim("bb"), DocumentEntry {
            name: "Other".into(),
            file_name: "other.pdf".into(),
            digest: FileDigest::from_bytes([0xff; 32]),
        })
        .await
        .expect("write");
        (ledger, owner)
    }

    #[tokio::test]
    async fn owner_pages_of_ten() {
        let (ledger, owner) = seeded(23).await;
        let catalogue = Catalogue::new(ledger);

        let first = catalogue.owner_page(&owner.owner, 1).await.expect("page 1");
        assert_eq!(first.documents.len(), 10);
        assert_eq!(first.total, 23);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.documents[0].file_name, "0.pdf");

        let last = catalogue.owner_page(&owner.owner, 3).await.expect("page 3");
        assert_eq!(last.documents.len(), 3);
        assert!(last.documents.iter().all(|d| d.owner == owner.owner));
    }

    #[tokio::test]
    async fn page_of_reports_unresolved_ids() {
        let (ledger, _) = seeded(2).await;
        let catalogue = Catalogue::with_page_size(ledger, 5);

        let page = catalogue
            .page_of(&[DocumentId(1), DocumentId(99), DocumentId(2)], 1)
            .await
            .expect("page");
        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.unresolved.len(), 1);
        assert_eq!(page.unresolved[0].id, DocumentId(99));
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn page_zero_is_rejected() {
        let (ledger, owner) = seeded(1).await;
        let catalogue = Catalogue::new(ledger);
        assert!(matches!(
            catalogue.owner_page(&owner.owner, 0).await,
            Err(HashmarkError::LedgerRejected(_))
        ));
    }
}
