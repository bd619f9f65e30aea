// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Hashmark.

use thiserror::Error;

/// Top-level error type for all Hashmark operations.
#[derive(Debug, Error)]
pub enum HashmarkError {
    // -- Input validation --
    #[error("no file selected")]
    NoFileSelected,

    #[error("no file reference supplied")]
    UnsupportedInput,

    #[error("file {name} is {size} bytes, which exceeds the {limit} byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("record title is required")]
    MissingTitle,

    #[error("record title is {len} characters long, the limit is {limit}")]
    TitleTooLong { len: usize, limit: usize },

    #[error("PDF inspection failed: {0}")]
    PdfError(String),

    // -- Digest errors --
    #[error("failed to read file content: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid owner address: {0}")]
    InvalidAddress(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },

    // -- References and ledger --
    #[error("reference record unavailable: {0}")]
    ReferenceUnavailable(String),

    #[error("ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("ledger rejected the request: {0}")]
    LedgerRejected(String),

    #[error("malformed ledger response: {0}")]
    LedgerResponse(String),

    #[error("caller is not authorized to write to the ledger")]
    Unauthorized,

    // -- Storage / persistence --
    #[error("database error: {0}")]
    Database(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, HashmarkError>;
