// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The ledger gateway trait.
//
// Query side mirrors the contract's read calls; write side mirrors its
// transactions. Every write names the caller through a `Claim`, and the
// ledger decides whether that caller owns the document being touched.

use std::future::Future;

use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{
    Claim, DocumentEntry, DocumentId, DocumentUpdate, FileDigest, LedgerDocument, OwnerAddress,
};
use serde::{Deserialize, Serialize};

/// Rows per page when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of document ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub ids: Vec<DocumentId>,
    /// Length of the whole id list that was paginated.
    pub total: u64,
}

impl Page {
    /// Cut page `page` (1-based) of `page_size` ids out of `ids`.
    ///
    /// A page past the end is empty but still reports the full total.
    pub fn window(page: u32, page_size: u32, ids: &[DocumentId]) -> Result<Self> {
        if page == 0 {
            return Err(HashmarkError::LedgerRejected("page numbers start at 1".into()));
        }
        if page_size == 0 {
            return Err(HashmarkError::LedgerRejected("page size must be positive".into()));
        }

        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let window = ids
            .iter()
            .skip(start)
            .take(page_size as usize)
            .copied()
            .collect();

        Ok(Self {
            ids: window,
            total: ids.len() as u64,
        })
    }

    /// Number of pages needed to show `total` ids, `page_size` at a time.
    pub fn count_pages(total: u64, page_size: u32) -> u64 {
        if page_size == 0 {
            return 0;
        }
        total.div_ceil(u64::from(page_size))
    }
}

/// Access to the document ledger.
///
/// Lookups are exact: by digest or by id, never fuzzy. The digest index only
/// covers active documents, so a retired document stops verifying but can
/// still be read by id.
pub trait LedgerGateway: Send + Sync {
    /// Ids of the active documents recorded with `digest`.
    fn lookup_ids_by_digest(
        &self,
        digest: &FileDigest,
    ) -> impl Future<Output = Result<Vec<DocumentId>>> + Send;

    /// Read one document. Unknown ids are `LedgerRejected`.
    fn read_by_id(&self, id: DocumentId) -> impl Future<Output = Result<LedgerDocument>> + Send;

    /// Ids of every document `owner` has written, retired ones included.
    fn list_ids_by_owner(
        &self,
        owner: &OwnerAddress,
    ) -> impl Future<Output = Result<Vec<DocumentId>>> + Send;

    /// One page of `ids`; see [`Page::window`].
    fn paginate(
        &self,
        page: u32,
        page_size: u32,
        ids: &[DocumentId],
    ) -> impl Future<Output = Result<Page>> + Send;

    /// Number of document slots ever allocated.
    fn total_slots(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Record a new document owned by the caller.
    fn write(
        &self,
        caller: &Claim,
        entry: DocumentEntry,
    ) -> impl Future<Output = Result<DocumentId>> + Send;

    /// Record several documents in one transaction. All or nothing.
    fn batch_write(
        &self,
        caller: &Claim,
        entries: Vec<DocumentEntry>,
    ) -> impl Future<Output = Result<Vec<DocumentId>>> + Send;

    /// Change fields of a document the caller owns.
    fn update(
        &self,
        caller: &Claim,
        id: DocumentId,
        update: DocumentUpdate,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Activate or retire a document the caller owns.
    fn change_status(
        &self,
        caller: &Claim,
        id: DocumentId,
        active: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u64) -> Vec<DocumentId> {
        (1..=n).map(DocumentId).collect()
    }

    #[test]
    fn first_page() {
        let page = Page::window(1, 10, &ids(25)).expect("page");
        assert_eq!(page.ids, ids(10));
        assert_eq!(page.total, 25);
    }

    #[test]
    fn last_partial_page() {
        let page = Page::window(3, 10, &ids(25)).expect("page");
        assert_eq!(page.ids.len(), 5);
        assert_eq!(page.ids[0], DocumentId(21));
    }

    #[test]
    fn page_past_end_is_empty() {
        let page = Page::window(4, 10, &ids(25)).expect("page");
        assert!(page.ids.is_empty());
        assert_eq!(page.total, 25);
    }

    #[test]
    fn page_zero_rejected() {
        assert!(matches!(
            Page::window(0, 10, &ids(3)),
            Err(HashmarkError::LedgerRejected(_))
        ));
        assert!(Page::window(1, 0, &ids(3)).is_err());
    }

    #[test]
    fn page_count() {
        assert_eq!(Page::count_pages(0, 10), 0);
        assert_eq!(Page::count_pages(10, 10), 1);
        assert_eq!(Page::count_pages(11, 10), 2);
    }
}
