// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Verification orchestrator — intake, digest, reference resolution, verdict.
//
// Three ways to decide whether a candidate file is authentic:
//
//   A. against a second uploaded file (pairwise compare),
//   B. against a reference already known: a stored record or a digest
//      copied from somewhere else (e.g. a ledger field),
//   C. by looking the candidate's digest up on the ledger.
//
// Validation always runs before any digest work, and a failed verification
// never produces a verdict.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use hashmark_core::config::{AppConfig, PolicyConfig};
use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{
    ComparisonVerdict, DocumentId, FileRecord, KnownDigest, LedgerDocument, ReferenceId,
    VerificationId,
};
use hashmark_document::{IntakeRules, Upload, validate};
use hashmark_integrity::{AuditAction, compare, digest_reader};
use hashmark_ledger::LedgerGateway;

use crate::reference::{ReferenceRecord, ReferenceSource};
use crate::trail::AuditTrail;

/// Intake rules and policies for every flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifierConfig {
    pub compare: IntakeRules,
    pub stored: IntakeRules,
    pub known: IntakeRules,
    pub ledger_lookup: IntakeRules,
    pub policies: PolicyConfig,
}

impl From<&AppConfig> for VerifierConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            compare: config.compare.into(),
            stored: config.stored.into(),
            known: config.known.into(),
            ledger_lookup: config.ledger_lookup.into(),
            policies: config.policies,
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Outcome of Flow A.
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub verification_id: VerificationId,
    pub verdict: ComparisonVerdict,
    pub reference: FileRecord,
    pub candidate: FileRecord,
}

/// Outcome of Flow B against a stored reference.
#[derive(Debug, Clone, Serialize)]
pub struct StoredReport {
    pub verification_id: VerificationId,
    pub verdict: ComparisonVerdict,
    pub reference: ReferenceRecord,
    pub candidate: FileRecord,
}

/// Outcome of Flow B against a known digest.
#[derive(Debug, Clone, Serialize)]
pub struct KnownReport {
    pub verification_id: VerificationId,
    pub verdict: ComparisonVerdict,
    pub reference: KnownDigest,
    pub candidate: FileRecord,
}

/// A ledger id that matched but could not be read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedDocument {
    pub id: DocumentId,
    pub reason: String,
}

/// Outcome of Flow C.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerReport {
    pub verification_id: VerificationId,
    pub candidate: FileRecord,
    /// Every active document recorded with the candidate's digest.
    pub matched_ids: Vec<DocumentId>,
    /// The matched documents that could be read.
    pub documents: Vec<LedgerDocument>,
    /// The matched ids that could not.
    pub unresolved: Vec<UnresolvedDocument>,
    pub overall_match: bool,
}

/// One file of a multi-file ledger verification.
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub outcome: Result<LedgerReport>,
}

/// What to verify a candidate against.
#[derive(Debug, Clone)]
pub enum Reference {
    Stored(ReferenceId),
    Known(KnownDigest),
    Ledger,
}

/// Result of [`Verifier::verify`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "flow", rename_all = "kebab-case")]
pub enum Verification {
    Stored(StoredReport),
    Known(KnownReport),
    Ledger(LedgerReport),
}

impl Verification {
    pub fn overall_match(&self) -> bool {
        match self {
            Self::Stored(report) => report.verdict.overall_match,
            Self::Known(report) => report.verdict.overall_match,
            Self::Ledger(report) => report.overall_match,
        }
    }

    pub fn verification_id(&self) -> VerificationId {
        match self {
            Self::Stored(report) => report.verification_id,
            Self::Known(report) => report.verification_id,
            Self::Ledger(report) => report.verification_id,
        }
    }
}

/// Validate an upload and digest it on the blocking pool.
pub async fn fingerprint(upload: Option<Upload>, rules: &IntakeRules) -> Result<FileRecord> {
    validate(upload.as_ref(), rules)?;
    let upload = upload.ok_or(HashmarkError::NoFileSelected)?;
    let ceiling = rules.max_size;

    tokio::task::spawn_blocking(move || -> Result<FileRecord> {
        let (digest, _) = digest_reader(&upload.name, upload.bytes.as_slice(), Some(ceiling))?;
        Ok(upload.to_record(digest))
    })
    .await
    .map_err(|err| HashmarkError::ReadError(std::io::Error::other(err)))?
}

/// Anything that went wrong talking to the ledger is reported as the ledger
/// being unavailable; the candidate itself was fine.
fn ledger_failure(err: HashmarkError) -> HashmarkError {
    match err {
        err @ HashmarkError::LedgerUnavailable(_) => err,
        other => HashmarkError::LedgerUnavailable(other.to_string()),
    }
}

/// Runs the verification flows against an injected ledger and reference source.
pub struct Verifier<L, R> {
    ledger: Arc<L>,
    references: R,
    config: VerifierConfig,
    audit: AuditTrail,
}

impl<L: LedgerGateway, R: ReferenceSource> Verifier<L, R> {
    pub fn new(ledger: Arc<L>, references: R, config: VerifierConfig) -> Self {
        Self {
            ledger,
            references,
            config,
            audit: AuditTrail::detached(),
        }
    }

    /// Record every verdict in `audit`.
    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = audit;
        self
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn references(&self) -> &R {
        &self.references
    }

    /// Flow A: compare two uploads with each other.
    #[instrument(skip_all)]
    pub async fn compare_pair(
        &self,
        reference: impl Into<Option<Upload>>,
        candidate: impl Into<Option<Upload>>,
    ) -> Result<PairReport> {
        let rules = &self.config.compare;
        let (reference, candidate) = (reference.into(), candidate.into());
        validate(reference.as_ref(), rules)?;
        validate(candidate.as_ref(), rules)?;

        let (reference, candidate) =
            tokio::try_join!(fingerprint(reference, rules), fingerprint(candidate, rules))?;

        let verdict = compare(&reference, &candidate, self.config.policies.pair);
        let verification_id = VerificationId::new();
        info!(
            %verification_id,
            reference = %reference.name,
            candidate = %candidate.name,
            matched = verdict.overall_match,
            "pairwise comparison finished"
        );
        self.audit.record(
            AuditAction::Compare,
            Some(verification_id),
            &candidate.digest,
            verdict.overall_match,
            Some(&format!("reference {} ({})", reference.name, reference.digest)),
        );

        Ok(PairReport {
            verification_id,
            verdict,
            reference,
            candidate,
        })
    }

    /// Flow B: verify against a stored reference record.
    #[instrument(skip(self, candidate))]
    pub async fn verify_against_stored(
        &self,
        reference_id: ReferenceId,
        candidate: impl Into<Option<Upload>>,
    ) -> Result<StoredReport> {
        let rules = &self.config.stored;
        let candidate = candidate.into();
        validate(candidate.as_ref(), rules)?;

        let reference = self.references.load(reference_id).await?;
        let candidate = fingerprint(candidate, rules).await?;

        let verdict = compare(&reference.record, &candidate, self.config.policies.stored);
        let verification_id = VerificationId::new();
        info!(%verification_id, matched = verdict.overall_match, "verified against stored reference");
        self.audit.record(
            AuditAction::VerifyStored,
            Some(verification_id),
            &candidate.digest,
            verdict.overall_match,
            Some(&format!("reference {}", reference.id)),
        );

        Ok(StoredReport {
            verification_id,
            verdict,
            reference,
            candidate,
        })
    }

    /// Flow B: verify against a digest known from elsewhere.
    #[instrument(skip_all, fields(reference = %known.file_name))]
    pub async fn verify_against_known(
        &self,
        known: &KnownDigest,
        candidate: impl Into<Option<Upload>>,
    ) -> Result<KnownReport> {
        let rules = &self.config.known;
        let candidate = fingerprint(candidate.into(), rules).await?;

        let verdict = compare(known, &candidate, self.config.policies.known);
        let verification_id = VerificationId::new();
        info!(%verification_id, matched = verdict.overall_match, "verified against known digest");
        self.audit.record(
            AuditAction::VerifyKnown,
            Some(verification_id),
            &candidate.digest,
            verdict.overall_match,
            Some(&format!("known {} ({})", known.file_name, known.digest)),
        );

        Ok(KnownReport {
            verification_id,
            verdict,
            reference: known.clone(),
            candidate,
        })
    }

    /// Flow C: look the candidate's digest up on the ledger.
    #[instrument(skip_all)]
    pub async fn verify_against_ledger(
        &self,
        candidate: impl Into<Option<Upload>>,
    ) -> Result<LedgerReport> {
        let candidate = fingerprint(candidate.into(), &self.config.ledger_lookup).await?;

        let matched_ids = self
            .ledger
            .lookup_ids_by_digest(&candidate.digest)
            .await
            .map_err(ledger_failure)?;
        debug!(matches = matched_ids.len(), "ledger lookup returned");

        let mut documents = Vec::with_capacity(matched_ids.len());
        let mut unresolved = Vec::new();
        for &id in &matched_ids {
            match self.ledger.read_by_id(id).await {
                Ok(document) => documents.push(document),
                Err(err) => {
                    warn!(%id, %err, "matched document could not be read");
                    unresolved.push(UnresolvedDocument {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let overall_match = !matched_ids.is_empty();
        let verification_id = VerificationId::new();
        info!(
            %verification_id,
            file = %candidate.name,
            matches = matched_ids.len(),
            unresolved = unresolved.len(),
            "verified against ledger"
        );
        self.audit.record(
            AuditAction::VerifyLedger,
            Some(verification_id),
            &candidate.digest,
            overall_match,
            Some(&format!("{} ledger match(es)", matched_ids.len())),
        );

        Ok(LedgerReport {
            verification_id,
            candidate,
            matched_ids,
            documents,
            unresolved,
            overall_match,
        })
    }

    /// Flow C for several files. One file failing does not stop the others.
    #[instrument(skip_all, fields(count = uploads.len()))]
    pub async fn verify_many_against_ledger(&self, uploads: Vec<Upload>) -> Result<Vec<BatchItem>> {
        if uploads.is_empty() {
            return Err(HashmarkError::NoFileSelected);
        }

        let mut items = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let name = upload.name.clone();
            let outcome = self.verify_against_ledger(upload).await;
            if let Err(err) = &outcome {
                warn!(%name, %err, "file could not be verified");
            }
            items.push(BatchItem { name, outcome });
        }
        Ok(items)
    }

    /// Verify `candidate` against whichever reference is given.
    pub async fn verify(
        &self,
        candidate: impl Into<Option<Upload>>,
        reference: Reference,
    ) -> Result<Verification> {
        let candidate = candidate.into();
        match reference {
            Reference::Stored(id) => self
                .verify_against_stored(id, candidate)
                .await
                .map(Verification::Stored),
            Reference::Known(known) => self
                .verify_against_known(&known, candidate)
                .await
                .map(Verification::Known),
            Reference::Ledger => self
                .verify_against_ledger(candidate)
                .await
                .map(Verification::Ledger),
        }
    }
}

#[cfg(test)]
mod tests {
    use hashmark_core::types::PDF_MEDIA_TYPE;
    use hashmark_integrity::digest_bytes;
    use hashmark_ledger::MemoryLedger;

    use super::*;
    use crate::reference::ReferenceStore;

    fn pdf(name: &str, bytes: &[u8]) -> Upload {
        Upload::new(name, Some(PDF_MEDIA_TYPE), bytes.to_vec())
    }

    fn verifier() -> Verifier<MemoryLedger, ReferenceStore> {
        Verifier::new(
            Arc::new(MemoryLedger::new()),
            ReferenceStore::open_in_memory().expect("store"),
            VerifierConfig::default(),
        )
    }

    #[tokio::test]
    async fn fingerprint_matches_direct_digest() {
        let record = fingerprint(Some(pdf("a.pdf", b"%PDF-1.4 body")), &VerifierConfig::default().stored)
            .await
            .expect("fingerprint");
        assert_eq!(record.digest, digest_bytes(b"%PDF-1.4 body"));
        assert_eq!(record.size, 13);
    }

    #[tokio::test]
    async fn pair_requires_both_files() {
        let v = verifier();
        assert!(matches!(
            v.compare_pair(pdf("a.pdf", b"x"), None::<Upload>).await,
            Err(HashmarkError::NoFileSelected)
        ));
    }

    #[tokio::test]
    async fn stored_reference_must_exist() {
        let v = verifier();
        assert!(matches!(
            v.verify_against_stored(ReferenceId::new(), pdf("a.pdf", b"x")).await,
            Err(HashmarkError::ReferenceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn invalid_candidate_fails_before_reference_lookup() {
        let v = verifier();
        assert!(matches!(
            v.verify_against_stored(ReferenceId::new(), None::<Upload>).await,
            Err(HashmarkError::NoFileSelected)
        ));
    }

    #[tokio::test]
    async fn known_digest_ignores_size() {
        let v = verifier();
        let known = KnownDigest {
            file_name: "a.pdf".into(),
            digest: digest_bytes(b"content"),
        };
        let report = v.verify_against_known(&known, pdf("a.pdf", b"content")).await.expect("verify");
        assert!(report.verdict.overall_match);
        assert_eq!(report.verdict.size_match, None);
    }

    #[tokio::test]
    async fn empty_ledger_batch_is_rejected() {
        let v = verifier();
        assert!(matches!(
            v.verify_many_against_ledger(Vec::new()).await,
            Err(HashmarkError::NoFileSelected)
        ));
    }

    #[test]
    fn ledger_errors_become_unavailable() {
        let mapped = ledger_failure(HashmarkError::Database("locked".into()));
        assert!(matches!(mapped, HashmarkError::LedgerUnavailable(d) if d.contains("locked")));
        let kept = ledger_failure(HashmarkError::LedgerUnavailable("timed out".into()));
        assert!(matches!(kept, HashmarkError::LedgerUnavailable(d) if d == "timed out"));
    }
}
