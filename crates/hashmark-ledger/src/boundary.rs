// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Contract boundary — untyped call results in, typed domain values out.
//
// A contract client hands back JSON-ish values: `uint256` as a number or a
// decimal string, `bytes32` and `address` as hex strings. Nothing crosses
// into the rest of Hashmark until it has been parsed here. The same goes the
// other way for arguments that use in-band sentinels.

use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{
    DocumentEntry, DocumentId, DocumentUpdate, FileDigest, LedgerDocument, OwnerAddress,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The tuple returned by the contract's `read(id)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocument {
    pub name: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "documentHash")]
    pub document_hash: String,
    pub owner: String,
    pub status: bool,
}

impl RawDocument {
    /// Validate the hex fields and attach the id the document was read by.
    pub fn parse(self, id: DocumentId) -> Result<LedgerDocument> {
        let digest = FileDigest::parse(&self.document_hash).map_err(|err| {
            HashmarkError::LedgerResponse(format!("document {id}: bad documentHash: {err}"))
        })?;
        let owner = OwnerAddress::parse(&self.owner).map_err(|err| {
            HashmarkError::LedgerResponse(format!("document {id}: bad owner: {err}"))
        })?;

        Ok(LedgerDocument {
            id,
            name: self.name,
            file_name: self.file_name,
            digest,
            owner,
            status: self.status,
        })
    }

    /// Parse a JSON value shaped like the `read` tuple.
    pub fn from_value(id: DocumentId, value: Value) -> Result<LedgerDocument> {
        let raw: RawDocument = serde_json::from_value(value)
            .map_err(|err| HashmarkError::LedgerResponse(format!("document {id}: {err}")))?;
        raw.parse(id)
    }
}

impl From<&LedgerDocument> for RawDocument {
    fn from(doc: &LedgerDocument) -> Self {
        Self {
            name: doc.name.clone(),
            file_name: doc.file_name.clone(),
            document_hash: doc.digest.to_hex(),
            owner: doc.owner.as_str().to_owned(),
            status: doc.status,
        }
    }
}

/// Parse a `uint256` id, given either as a JSON number or a decimal string.
pub fn parse_id(value: &Value) -> Result<DocumentId> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .map(DocumentId)
        .ok_or_else(|| HashmarkError::LedgerResponse(format!("not a document id: {value}")))
}

/// Parse a `uint256[]` result.
pub fn parse_id_list(value: &Value) -> Result<Vec<DocumentId>> {
    match value {
        Value::Array(items) => items.iter().map(parse_id).collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(HashmarkError::LedgerResponse(format!(
            "expected an id list, got {other}"
        ))),
    }
}

/// Arguments of the contract's `update` transaction.
///
/// The contract has no optional parameters: an empty string leaves a text
/// field unchanged and a zero hash leaves the digest unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateArgs {
    pub id: DocumentId,
    pub name: String,
    pub file_name: String,
    pub new_hash: FileDigest,
}

impl UpdateArgs {
    pub fn encode(id: DocumentId, update: &DocumentUpdate) -> Self {
        Self {
            id,
            name: update.name.clone().unwrap_or_default(),
            file_name: update.file_name.clone().unwrap_or_default(),
            new_hash: update.digest.unwrap_or(FileDigest::ZERO),
        }
    }

    pub fn decode(self) -> (DocumentId, DocumentUpdate) {
        let update = DocumentUpdate {
            name: Some(self.name).filter(|s| !s.is_empty()),
            file_name: Some(self.file_name).filter(|s| !s.is_empty()),
            digest: Some(self.new_hash).filter(|d| !d.is_zero()),
        };
        (self.id, update)
    }
}

/// Arguments of the contract's `batchWrite` transaction: three parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchArgs {
    pub names: Vec<String>,
    pub file_names: Vec<String>,
    pub hashes: Vec<FileDigest>,
}

impl BatchArgs {
    pub fn encode(entries: &[DocumentEntry]) -> Self {
        let mut args = Self::default();
        for entry in entries {
            args.names.push(entry.name.clone());
            args.file_names.push(entry.file_name.clone());
            args.hashes.push(entry.digest);
        }
        args
    }

    /// Zip the arrays back into entries. Arrays of different lengths are
    /// rejected the way the contract rejects them.
    pub fn into_entries(self) -> Result<Vec<DocumentEntry>> {
        let len = self.names.len();
        if self.file_names.len() != len || self.hashes.len() != len {
            return Err(HashmarkError::LedgerRejected(format!(
                "batch arrays differ in length: {} names, {} file names, {} hashes",
                len,
                self.file_names.len(),
                self.hashes.len()
            )));
        }

        Ok(self
            .names
            .into_iter()
            .zip(self.file_names)
            .zip(self.hashes)
            .map(|((name, file_name), digest)| DocumentEntry {
                name,
                file_name,
                digest,
            })
            .collect())
    }
}
