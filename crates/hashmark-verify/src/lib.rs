// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hashmark-verify — Verification flows and ledger publishing for Hashmark.
//
// Ties intake, digests, the comparator, the reference store and the ledger
// gateway together. Collaborators are injected; nothing here reaches for a
// global ledger or database.

pub mod catalogue;
pub mod orchestrator;
pub mod publisher;
pub mod reference;
pub mod trail;

pub use catalogue::{Catalogue, CataloguePage};
pub use orchestrator::{
    BatchItem, KnownReport, LedgerReport, PairReport, Reference, StoredReport, UnresolvedDocument,
    Verification, Verifier, VerifierConfig, fingerprint,
};
pub use publisher::{BatchReceipt, Published, Publisher};
pub use reference::{ReferenceRecord, ReferenceSource, ReferenceStore};
pub use trail::AuditTrail;
