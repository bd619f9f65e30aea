// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fingerprint comparator — exact-match verification under a policy.

use hashmark_core::types::{ComparisonVerdict, Fingerprinted, MatchPolicy};

/// Compare `candidate` against `reference`.
///
/// The digest must always match. Name and size count only when `policy`
/// asks for them; a required size that either side does not know fails.
/// Matching is exact: case-sensitive names, byte-for-byte digests.
pub fn compare<R, C>(reference: &R, candidate: &C, policy: MatchPolicy) -> ComparisonVerdict
where
    R: Fingerprinted + ?Sized,
    C: Fingerprinted + ?Sized,
{
    let name_match = reference.file_name() == candidate.file_name();
    let digest_match = reference.digest() == candidate.digest();
    let size_match = policy.require_size.then(|| {
        match (reference.size_bytes(), candidate.size_bytes()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    });

    let overall_match =
        digest_match && (name_match || !policy.require_name) && size_match.unwrap_or(true);

    ComparisonVerdict {
        name_match,
        size_match,
        digest_match,
        overall_match,
    }
}
