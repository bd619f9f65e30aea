// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end verification flows over the in-memory ledger and an in-memory
// reference store.

use std::sync::Arc;
use std::time::Duration;

use hashmark_core::config::AppConfig;
use hashmark_core::error::HashmarkError;
use hashmark_core::types::{
    Claim, DocumentEntry, DocumentId, KnownDigest, MatchPolicy, OwnerAddress, PDF_MEDIA_TYPE,
};
use hashmark_document::Upload;
use hashmark_integrity::{AuditLog, digest_bytes};
use hashmark_ledger::{LedgerGateway, MemoryLedger, ResilientLedger, RetryConfig};
use hashmark_verify::{
    AuditTrail, Publisher, Reference, ReferenceStore, Verification, Verifier, VerifierConfig,
};

fn pdf(name: &str, bytes: &[u8]) -> Upload {
    Upload::new(name, Some(PDF_MEDIA_TYPE), bytes.to_vec())
}

fn thousand_bytes() -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(1000, b'.');
    bytes
}

fn owner() -> Claim {
    Claim::for_owner(OwnerAddress::parse(&format!("0x{}", "5a".repeat(20))).expect("address"))
}

fn verifier_with(config: VerifierConfig) -> Verifier<MemoryLedger, ReferenceStore> {
    Verifier::new(
        Arc::new(MemoryLedger::new()),
        ReferenceStore::open_in_memory().expect("store"),
        config,
    )
}

#[tokio::test]
async fn identical_files_match_on_every_field() {
    let verifier = verifier_with(VerifierConfig::default());
    let bytes = thousand_bytes();

    let report = verifier
        .compare_pair(pdf("a.pdf", &bytes), pdf("a.pdf", &bytes))
        .await
        .expect("compare");

    assert!(report.verdict.name_match);
    assert_eq!(report.verdict.size_match, Some(true));
    assert!(report.verdict.digest_match);
    assert!(report.verdict.overall_match);
    assert_eq!(report.reference.size, 1000);
    assert_eq!(report.candidate.digest, digest_bytes(&bytes));
}

#[tokio::test]
async fn renamed_copy_depends_on_policy() {
    let bytes = thousand_bytes();

    let strict = verifier_with(VerifierConfig::default());
    let report = strict
        .compare_pair(pdf("a.pdf", &bytes), pdf("b.pdf", &bytes))
        .await
        .expect("compare");
    assert!(report.verdict.digest_match);
    assert!(!report.verdict.name_match);
    assert!(!report.verdict.overall_match);

    let mut config = VerifierConfig::default();
    config.policies.pair = MatchPolicy::DIGEST_ONLY;
    let lenient = verifier_with(config);
    let report = lenient
        .compare_pair(pdf("a.pdf", &bytes), pdf("b.pdf", &bytes))
        .await
        .expect("compare");
    assert!(report.verdict.overall_match);
}

#[tokio::test]
async fn oversized_candidate_rejected_before_digest() {
    let mut app = AppConfig::default();
    app.ledger_lookup.max_size = 1024;
    let audit = AuditTrail::attach(AuditLog::open_in_memory().expect("audit"));
    let ledger = Arc::new(MemoryLedger::new());
    let verifier = Verifier::new(
        ledger.clone(),
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::from(&app),
    )
    .with_audit(audit.clone());

    let at_limit = verifier
        .verify_against_ledger(pdf("ok.pdf", &[7u8; 1024]))
        .await;
    assert!(at_limit.is_ok());

    match verifier.verify_against_ledger(pdf("big.pdf", &[7u8; 1025])).await {
        Err(HashmarkError::FileTooLarge { size, limit, .. }) => {
            assert_eq!(size, 1025);
            assert_eq!(limit, 1024);
        }
        other => panic!("expected FileTooLarge, got {other:?}"),
    }

    // Only the accepted file reached the ledger and the audit trail.
    assert_eq!(ledger.calls(), 1);
    let recorded = audit.with_log(|log| log.count()).expect("attached").expect("count");
    assert_eq!(recorded, 1);
}

#[tokio::test]
async fn unknown_digest_is_not_a_match() {
    let verifier = verifier_with(VerifierConfig::default());
    let report = verifier
        .verify_against_ledger(pdf("unknown.pdf", b"never published"))
        .await
        .expect("verify");

    assert!(!report.overall_match);
    assert!(report.matched_ids.is_empty());
    assert!(report.documents.is_empty());
}

#[tokio::test]
async fn two_ledger_matches_are_both_resolved() {
    let ledger = Arc::new(MemoryLedger::new());
    let config = AppConfig::default();
    let publisher = Publisher::new(ledger.clone(), &config);
    let claim = owner();
    let bytes = thousand_bytes();

    publisher
        .publish(Some(&claim), "Original", pdf("a.pdf", &bytes))
        .await
        .expect("publish");
    publisher
        .publish(Some(&claim), "Re-issued", pdf("a-copy.pdf", &bytes))
        .await
        .expect("publish");

    let verifier = Verifier::new(
        ledger,
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::from(&config),
    );
    let report = verifier
        .verify_against_ledger(pdf("whatever.pdf", &bytes))
        .await
        .expect("verify");

    assert!(report.overall_match);
    assert_eq!(report.matched_ids, vec![DocumentId(1), DocumentId(2)]);
    let titles: Vec<_> = report.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(titles, ["Original", "Re-issued"]);
    assert!(report.unresolved.is_empty());
}

#[tokio::test]
async fn retired_document_stops_verifying() {
    let ledger = Arc::new(MemoryLedger::new());
    let config = AppConfig::default();
    let publisher = Publisher::new(ledger.clone(), &config);
    let claim = owner();
    let id = publisher
        .publish(Some(&claim), "Certificate", pdf("cert.pdf", b"%PDF-1.4 cert"))
        .await
        .expect("publish")
        .id;
    publisher.retire(Some(&claim), id).await.expect("retire");

    let verifier = Verifier::new(
        ledger,
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::from(&config),
    );
    let report = verifier
        .verify_against_ledger(pdf("cert.pdf", b"%PDF-1.4 cert"))
        .await
        .expect("verify");
    assert!(!report.overall_match);
}

#[tokio::test]
async fn stored_reference_round_trip() {
    let verifier = verifier_with(VerifierConfig::default());
    let bytes = thousand_bytes();
    let record = hashmark_verify::fingerprint(Some(pdf("contract.pdf", &bytes)), &verifier.config().stored)
        .await
        .expect("fingerprint");
    let stored = verifier.references().insert("Contract", record).expect("insert");

    let genuine = verifier
        .verify(pdf("contract.pdf", &bytes), Reference::Stored(stored.id))
        .await
        .expect("verify");
    assert!(genuine.overall_match());
    let json = serde_json::to_value(&genuine).expect("json");
    assert_eq!(json["flow"], "stored");
    assert_eq!(json["reference"]["label"], "Contract");

    let mut tampered = bytes.clone();
    tampered[500] ^= 0x01;
    let forged = verifier
        .verify(pdf("contract.pdf", &tampered), Reference::Stored(stored.id))
        .await
        .expect("verify");
    assert!(!forged.overall_match());
    match forged {
        Verification::Stored(report) => {
            assert!(report.verdict.name_match);
            assert!(!report.verdict.digest_match);
        }
        other => panic!("unexpected flow: {other:?}"),
    }
}

#[tokio::test]
async fn known_digest_from_ledger_field() {
    let ledger = Arc::new(MemoryLedger::new());
    let claim = owner();
    let digest = digest_bytes(b"%PDF-1.4 transcript");
    let id = ledger
        .write(&claim, DocumentEntry {
            name: "Transcript".into(),
            file_name: "transcript.pdf".into(),
            digest,
        })
        .await
        .expect("write");
    let document = ledger.read_by_id(id).await.expect("read");

    let verifier = Verifier::new(
        ledger,
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::default(),
    );
    let known = KnownDigest::from(&document);

    let same = verifier
        .verify(pdf("transcript.pdf", b"%PDF-1.4 transcript"), Reference::Known(known.clone()))
        .await
        .expect("verify");
    assert!(same.overall_match());

    let renamed = verifier
        .verify(pdf("renamed.pdf", b"%PDF-1.4 transcript"), Reference::Known(known))
        .await
        .expect("verify");
    assert!(!renamed.overall_match());
}

#[tokio::test]
async fn missing_stored_reference_is_unavailable() {
    let verifier = verifier_with(VerifierConfig::default());
    let result = verifier
        .verify(pdf("a.pdf", b"x"), Reference::Stored(Default::default()))
        .await;
    assert!(matches!(result, Err(HashmarkError::ReferenceUnavailable(_))));
}

#[tokio::test]
async fn batch_reports_each_file() {
    let ledger = Arc::new(MemoryLedger::new());
    let claim = owner();
    ledger
        .write(&claim, DocumentEntry {
            name: "Known".into(),
            file_name: "known.pdf".into(),
            digest: digest_bytes(b"known"),
        })
        .await
        .expect("write");

    let mut app = AppConfig::default();
    app.ledger_lookup.max_size = 16;
    let verifier = Verifier::new(
        ledger,
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::from(&app),
    );

    let items = verifier
        .verify_many_against_ledger(vec![
            pdf("known.pdf", b"known"),
            pdf("unknown.pdf", b"unknown"),
            pdf("huge.pdf", &[0u8; 64]),
        ])
        .await
        .expect("batch");

    assert_eq!(items.len(), 3);
    assert!(items[0].outcome.as_ref().expect("known").overall_match);
    assert!(!items[1].outcome.as_ref().expect("unknown").overall_match);
    assert!(matches!(items[2].outcome, Err(HashmarkError::FileTooLarge { .. })));
}

#[tokio::test]
async fn flaky_ledger_is_retried_then_reported() {
    let retry = RetryConfig {
        max_retries: 2,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    };
    let ledger = Arc::new(ResilientLedger::new(MemoryLedger::new(), retry, Duration::from_secs(5)));
    let verifier = Verifier::new(
        ledger.clone(),
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::default(),
    );

    ledger.inner().fail_next(2);
    let report = verifier
        .verify_against_ledger(pdf("a.pdf", b"content"))
        .await
        .expect("recovers after retries");
    assert!(!report.overall_match);

    ledger.inner().fail_next(10);
    assert!(matches!(
        verifier.verify_against_ledger(pdf("a.pdf", b"content")).await,
        Err(HashmarkError::LedgerUnavailable(_))
    ));
}

#[tokio::test]
async fn slow_ledger_times_out_as_unavailable() {
    let retry = RetryConfig {
        max_retries: 0,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(1),
    };
    let ledger = Arc::new(ResilientLedger::new(
        MemoryLedger::new(),
        retry,
        Duration::from_millis(20),
    ));
    ledger.inner().set_latency(Some(Duration::from_millis(500)));

    let verifier = Verifier::new(
        ledger,
        ReferenceStore::open_in_memory().expect("store"),
        VerifierConfig::default(),
    );
    assert!(matches!(
        verifier.verify_against_ledger(pdf("a.pdf", b"content")).await,
        Err(HashmarkError::LedgerUnavailable(_))
    ));
}
