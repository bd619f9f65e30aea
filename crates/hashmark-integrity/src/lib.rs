// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hashmark-integrity — Content fingerprints for document verification.
//
// Computes SHA-256 digests of file content (in memory or streamed), compares
// fingerprints under an explicit match policy, and keeps a tamper-evident
// audit trail of every verification.

pub mod audit;
pub mod compare;
pub mod integrity;

pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use compare::compare;
pub use integrity::{digest_bytes, digest_file, digest_reader, verify_digest};
