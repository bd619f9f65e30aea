// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Hashmark: digests, file records, match policies,
// verdicts, and the typed view of ledger documents.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::HashmarkError;

/// The only media type accepted by flows that enforce one.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

/// SHA-256 fingerprint of a file's byte content.
///
/// The canonical text form is `0x` followed by 64 lowercase hex characters.
/// That exact form is used wherever a digest crosses a boundary, because the
/// ledger stores digests as a fixed-width `bytes32` keyed by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileDigest([u8; FileDigest::LEN]);

impl FileDigest {
    /// Raw digest length in bytes.
    pub const LEN: usize = 32;
    /// Marker prepended to the hex form.
    pub const PREFIX: &'static str = "0x";
    /// All-zero digest. The ledger reads it as "digest unchanged" in updates.
    pub const ZERO: Self = Self([0u8; Self::LEN]);

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; Self::LEN]
    }

    /// Canonical `0x`-prefixed lowercase hex string.
    pub fn to_hex(&self) -> String {
        format!("{}{}", Self::PREFIX, hex::encode(self.0))
    }

    /// Parse the canonical text form. Hex digits may be upper or lower case;
    /// the prefix and the exact length are mandatory.
    pub fn parse(text: &str) -> Result<Self, HashmarkError> {
        let body = text.strip_prefix(Self::PREFIX).ok_or_else(|| {
            HashmarkError::InvalidDigest(format!("missing {} prefix in {text:?}", Self::PREFIX))
        })?;

        if body.len() != Self::LEN * 2 {
            return Err(HashmarkError::InvalidDigest(format!(
                "expected {} hex characters, got {}",
                Self::LEN * 2,
                body.len()
            )));
        }

        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| HashmarkError::InvalidDigest(format!("{text:?}: {e}")))?;
        Ok(Self(bytes))
    }

    /// Shortened form for tables: the first and last `visible` characters of
    /// the hex string joined by `...`.
    pub fn abbreviated(&self, visible: usize) -> String {
        abbreviate(&self.to_hex(), visible)
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileDigest({})", self.to_hex())
    }
}

impl FromStr for FileDigest {
    type Err = HashmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FileDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FileDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Keep the first and last `visible` characters of `text`.
pub fn abbreviate(text: &str, visible: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= visible * 2 {
        return text.to_owned();
    }
    let head: String = chars[..visible].iter().collect();
    let tail: String = chars[chars.len() - visible..].iter().collect();
    format!("{head}...{tail}")
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Ledger-assigned document id (a `uint256` slot number on the contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a locally stored reference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceId(pub Uuid);

impl ReferenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReferenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReferenceId {
    type Err = HashmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| HashmarkError::ReferenceUnavailable(format!("bad reference id {s:?}: {e}")))
    }
}

/// Tags a single verification request for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationId(pub Uuid);

impl VerificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VerificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VerificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte account address in `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerAddress(String);

impl OwnerAddress {
    const HEX_LEN: usize = 40;

    pub fn parse(text: &str) -> Result<Self, HashmarkError> {
        let body = text
            .strip_prefix("0x")
            .ok_or_else(|| HashmarkError::InvalidAddress(format!("missing 0x prefix in {text:?}")))?;
        if body.len() != Self::HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashmarkError::InvalidAddress(format!(
                "expected 0x followed by {} hex characters, got {text:?}",
                Self::HEX_LEN
            )));
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OwnerAddress {
    type Err = HashmarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for OwnerAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OwnerAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Opaque proof that the caller may write to the ledger.
///
/// Produced by whatever authentication and wallet layer sits in front of
/// Hashmark; the ledger only ever sees the owner address it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub owner: OwnerAddress,
}

impl Claim {
    pub fn for_owner(owner: OwnerAddress) -> Self {
        Self { owner }
    }
}

// ---------------------------------------------------------------------------
// Records and fingerprints
// ---------------------------------------------------------------------------

/// Metadata plus digest of one file, captured when it was hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Media type declared by the uploader, if any.
    pub media_type: Option<String>,
    pub digest: FileDigest,
    pub last_modified: DateTime<Utc>,
}

/// Anything that can stand on either side of a fingerprint comparison.
pub trait Fingerprinted {
    fn file_name(&self) -> &str;
    /// `None` when the source does not record a size (ledger documents).
    fn size_bytes(&self) -> Option<u64>;
    fn digest(&self) -> &FileDigest;
}

impl Fingerprinted for FileRecord {
    fn file_name(&self) -> &str {
        &self.name
    }

    fn size_bytes(&self) -> Option<u64> {
        Some(self.size)
    }

    fn digest(&self) -> &FileDigest {
        &self.digest
    }
}

/// A digest that is already known, e.g. copied from a ledger field, together
/// with the file name it was recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownDigest {
    pub file_name: String,
    pub digest: FileDigest,
}

impl From<&LedgerDocument> for KnownDigest {
    fn from(doc: &LedgerDocument) -> Self {
        Self {
            file_name: doc.file_name.clone(),
            digest: doc.digest,
        }
    }
}

impl Fingerprinted for KnownDigest {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn size_bytes(&self) -> Option<u64> {
        None
    }

    fn digest(&self) -> &FileDigest {
        &self.digest
    }
}

/// Which auxiliary fields must match, on top of the digest, for a
/// comparison to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPolicy {
    pub require_name: bool,
    pub require_size: bool,
}

impl MatchPolicy {
    /// Name, size, and digest.
    pub const FULL: Self = Self {
        require_name: true,
        require_size: true,
    };
    /// Name and digest.
    pub const NAME_AND_DIGEST: Self = Self {
        require_name: true,
        require_size: false,
    };
    /// Digest alone.
    pub const DIGEST_ONLY: Self = Self {
        require_name: false,
        require_size: false,
    };
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self::FULL
    }
}

/// Outcome of comparing a candidate against a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonVerdict {
    pub name_match: bool,
    /// Only evaluated when the policy requires it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_match: Option<bool>,
    pub digest_match: bool,
    pub overall_match: bool,
}

// ---------------------------------------------------------------------------
// Ledger documents
// ---------------------------------------------------------------------------

/// Typed view of one ledger slot, parsed and validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub id: DocumentId,
    /// Record title chosen by the publisher.
    pub name: String,
    pub file_name: String,
    pub digest: FileDigest,
    pub owner: OwnerAddress,
    /// `false` once the owner has retired the document.
    pub status: bool,
}

impl LedgerDocument {
    pub fn is_active(&self) -> bool {
        self.status
    }
}

impl Fingerprinted for LedgerDocument {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn size_bytes(&self) -> Option<u64> {
        None
    }

    fn digest(&self) -> &FileDigest {
        &self.digest
    }
}

/// A new document to record on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub name: String,
    pub file_name: String,
    pub digest: FileDigest,
}

/// Changes to an existing ledger document. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpdate {
    pub name: Option<String>,
    pub file_name: Option<String>,
    pub digest: Option<FileDigest>,
}

impl DocumentUpdate {
    pub fn is_noop(&self) -> bool {
        self.name.is_none() && self.file_name.is_none() && self.digest.is_none()
    }
}

/// Classification of errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// Network blip, timeout, busy node — safe to retry automatically.
    Transient,
    /// The user has to do something (pick another file, reconnect a wallet).
    UserAction,
    /// Retrying cannot help.
    Permanent,
}
