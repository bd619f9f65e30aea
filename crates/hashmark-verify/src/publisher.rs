// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Publishing — record, revise and retire documents on the ledger.
//
// Checks run in the order a user meets them: authorization, then the record
// title, then the files. Files are fingerprinted locally; only the digest
// and metadata ever reach the ledger.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use hashmark_core::config::AppConfig;
use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{Claim, DocumentEntry, DocumentId, DocumentUpdate, FileRecord};
use hashmark_document::{IntakeRules, Rejected, Upload, partition_batch, validate_title};
use hashmark_integrity::AuditAction;
use hashmark_ledger::LedgerGateway;

use crate::orchestrator::fingerprint;
use crate::trail::AuditTrail;

/// A document that made it onto the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct Published {
    pub id: DocumentId,
    pub record: FileRecord,
}

/// Outcome of a batch publish.
#[derive(Debug)]
pub struct BatchReceipt {
    pub published: Vec<Published>,
    /// Files left out of the batch, with the reason.
    pub skipped: Vec<Rejected>,
}

/// Writes documents to the ledger on behalf of an authorized caller.
pub struct Publisher<L> {
    ledger: Arc<L>,
    rules: IntakeRules,
    title_max_chars: usize,
    audit: AuditTrail,
}

fn authorized(claim: Option<&Claim>) -> Result<&Claim> {
    claim.ok_or(HashmarkError::Unauthorized)
}

impl<L: LedgerGateway> Publisher<L> {
    pub fn new(ledger: Arc<L>, config: &AppConfig) -> Self {
        Self {
            ledger,
            rules: config.publish.into(),
            title_max_chars: config.title_max_chars,
            audit: AuditTrail::detached(),
        }
    }

    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = audit;
        self
    }

    /// Record one file under `title`.
    #[instrument(skip_all, fields(title = %title))]
    pub async fn publish(
        &self,
        claim: Option<&Claim>,
        title: &str,
        upload: impl Into<Option<Upload>>,
    ) -> Result<Published> {
        let claim = authorized(claim)?;
        let title = validate_title(title, self.title_max_chars)?;
        let record = fingerprint(upload.into(), &self.rules).await?;

        let entry = DocumentEntry {
            name: title.to_owned(),
            file_name: record.name.clone(),
            digest: record.digest,
        };
        let id = self.ledger.write(claim, entry).await?;

        info!(%id, file = %record.name, "document published");
        self.audit.record(
            AuditAction::Publish,
            None,
            &record.digest,
            true,
            Some(&format!("document {id}")),
        );
        Ok(Published { id, record })
    }

    /// Record several files, all under the same `title`, in one transaction.
    ///
    /// Files that fail intake (too large, not a PDF) are skipped and
    /// reported; the rest are still published.
    #[instrument(skip_all, fields(title = %title, count = uploads.len()))]
    pub async fn publish_batch(
        &self,
        claim: Option<&Claim>,
        title: &str,
        uploads: Vec<Upload>,
    ) -> Result<BatchReceipt> {
        let claim = authorized(claim)?;
        let title = validate_title(title, self.title_max_chars)?;
        if uploads.is_empty() {
            return Err(HashmarkError::NoFileSelected);
        }

        let (accepted, skipped) = partition_batch(uploads, &self.rules);
        if accepted.is_empty() {
            warn!(skipped = skipped.len(), "every file in the batch was skipped");
            return Ok(BatchReceipt {
                published: Vec::new(),
                skipped,
            });
        }

        let mut records = Vec::with_capacity(accepted.len());
        for upload in accepted {
            records.push(fingerprint(Some(upload), &self.rules).await?);
        }

        let entries = records
            .iter()
            .map(|record| DocumentEntry {
                name: title.to_owned(),
                file_name: record.name.clone(),
                digest: record.digest,
            })
            .collect();
        let ids = self.ledger.batch_write(claim, entries).await?;
        if ids.len() != records.len() {
            return Err(HashmarkError::LedgerResponse(format!(
                "batch of {} produced {} ids",
                records.len(),
                ids.len()
            )));
        }

        let published: Vec<_> = ids
            .into_iter()
            .zip(records)
            .map(|(id, record)| Published { id, record })
            .collect();
        for item in &published {
            self.audit.record(
                AuditAction::Publish,
                None,
                &item.record.digest,
                true,
                Some(&format!("document {} (batch)", item.id)),
            );
        }

        info!(published = published.len(), skipped = skipped.len(), "batch published");
        Ok(BatchReceipt { published, skipped })
    }

    /// Change the title and/or replace the file of document `id`.
    ///
    /// A title equal to the current one and a missing file both mean "keep
    /// as is". Returns the change that was sent, which is empty when there
    /// was nothing to change.
    #[instrument(skip(self, claim, title, upload))]
    pub async fn revise(
        &self,
        claim: Option<&Claim>,
        id: DocumentId,
        title: &str,
        upload: Option<Upload>,
    ) -> Result<DocumentUpdate> {
        let claim = authorized(claim)?;
        let title = validate_title(title, self.title_max_chars)?;
        let current = self.ledger.read_by_id(id).await?;
        if current.owner != claim.owner {
            return Err(HashmarkError::Unauthorized);
        }

        let replacement = match upload {
            Some(upload) => Some(fingerprint(Some(upload), &self.rules).await?),
            None => None,
        };

        let update = DocumentUpdate {
            name: (title != current.name).then(|| title.to_owned()),
            file_name: replacement.as_ref().map(|record| record.name.clone()),
            digest: replacement.as_ref().map(|record| record.digest),
        };
        if update.is_noop() {
            info!("nothing to change");
            return Ok(update);
        }

        self.ledger.update(claim, id, update.clone()).await?;
        info!(renamed = update.name.is_some(), replaced = update.digest.is_some(), "document revised");
        self.audit.record(
            AuditAction::Revise,
            None,
            update.digest.as_ref().unwrap_or(&current.digest),
            true,
            Some(&format!("document {id}")),
        );
        Ok(update)
    }

    /// Retire document `id` so it no longer verifies.
    #[instrument(skip(self, claim))]
    pub async fn retire(&self, claim: Option<&Claim>, id: DocumentId) -> Result<()> {
        let claim = authorized(claim)?;
        let current = self.ledger.read_by_id(id).await?;
        self.ledger.change_status(claim, id, false).await?;

        info!("document retired");
        self.audit.record(
            AuditAction::Retire,
            None,
            &current.digest,
            true,
            Some(&format!("document {id}")),
        );
        Ok(())
    }
}
