// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Upload intake — input validation that runs before any digest is computed.
//
// Everything rejected here is user-recoverable: pick another file, fix the
// title. Nothing in this module touches the ledger.

use std::path::Path;

use chrono::{DateTime, Utc};
use hashmark_core::config::FlowConfig;
use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::{FileDigest, FileRecord, PDF_MEDIA_TYPE};
use tracing::{debug, instrument, warn};

use crate::pdf::inspect::sniff_pdf;

/// One file handed in by a user, however the bytes arrived.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    /// Media type declared by the client (browser, CLI guess), if any.
    pub declared_media_type: Option<String>,
    pub bytes: Vec<u8>,
    pub last_modified: DateTime<Utc>,
}

impl Upload {
    pub fn new(name: impl Into<String>, declared_media_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            declared_media_type: declared_media_type.map(str::to_owned),
            bytes,
            last_modified: Utc::now(),
        }
    }

    /// Read a file from disk, declaring its media type from the extension.
    ///
    /// The size is checked against `max_size` from the file metadata before
    /// the content is read.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), max_size = max_size))]
    pub fn from_path(path: impl AsRef<Path>, max_size: u64) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or(HashmarkError::UnsupportedInput)?;

        let metadata = std::fs::metadata(path)?;
        if metadata.len() > max_size {
            return Err(HashmarkError::FileTooLarge {
                name,
                size: metadata.len(),
                limit: max_size,
            });
        }

        let bytes = std::fs::read(path).map_err(HashmarkError::ReadError)?;
        let last_modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        debug!(bytes = bytes.len(), "upload read from disk");
        Ok(Self {
            declared_media_type: guess_media_type(&name).map(str::to_owned),
            name,
            bytes,
            last_modified,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Pair this upload's metadata with its computed digest.
    pub fn to_record(&self, digest: FileDigest) -> FileRecord {
        FileRecord {
            name: self.name.clone(),
            size: self.size(),
            media_type: self.declared_media_type.clone(),
            digest,
            last_modified: self.last_modified,
        }
    }
}

/// Media type implied by a file name's extension.
pub fn guess_media_type(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "pdf" => Some(PDF_MEDIA_TYPE),
        "txt" => Some("text/plain"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "doc" => Some("application/msword"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        _ => None,
    }
}

/// Validation rules for one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeRules {
    /// Largest accepted size in bytes; exactly this size passes.
    pub max_size: u64,
    /// Only `application/pdf` is accepted.
    pub require_pdf: bool,
    /// Also require the `%PDF-` header when a PDF is required.
    pub sniff_content: bool,
}

impl From<FlowConfig> for IntakeRules {
    fn from(flow: FlowConfig) -> Self {
        Self {
            max_size: flow.max_size,
            require_pdf: flow.require_pdf,
            sniff_content: false,
        }
    }
}

/// Check an upload against `rules`. `None` means the user picked nothing.
pub fn validate<'a>(upload: Option<&'a Upload>, rules: &IntakeRules) -> Result<&'a Upload> {
    let upload = upload.ok_or(HashmarkError::NoFileSelected)?;

    if upload.size() > rules.max_size {
        return Err(HashmarkError::FileTooLarge {
            name: upload.name.clone(),
            size: upload.size(),
            limit: rules.max_size,
        });
    }

    if rules.require_pdf {
        let declared = upload.declared_media_type.as_deref().unwrap_or("unknown");
        if declared != PDF_MEDIA_TYPE {
            return Err(HashmarkError::UnsupportedMediaType(declared.to_owned()));
        }
        if rules.sniff_content && !sniff_pdf(&upload.bytes) {
            return Err(HashmarkError::UnsupportedMediaType(format!(
                "{declared} (content is not a PDF)"
            )));
        }
    }

    Ok(upload)
}

/// Check a record title and return it trimmed.
pub fn validate_title(title: &str, max_chars: usize) -> Result<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(HashmarkError::MissingTitle);
    }

    let len = trimmed.chars().count();
    if len > max_chars {
        return Err(HashmarkError::TitleTooLong {
            len,
            limit: max_chars,
        });
    }
    Ok(trimmed)
}

/// A batch member that did not pass intake.
#[derive(Debug)]
pub struct Rejected {
    pub name: String,
    pub reason: HashmarkError,
}

/// Split a batch into accepted uploads and rejected ones.
///
/// One bad file does not sink the batch: it is set aside with its reason and
/// the rest go ahead.
pub fn partition_batch(uploads: Vec<Upload>, rules: &IntakeRules) -> (Vec<Upload>, Vec<Rejected>) {
    let mut accepted = Vec::with_capacity(uploads.len());
    let mut rejected = Vec::new();

    for upload in uploads {
        match validate(Some(&upload), rules) {
            Ok(_) => accepted.push(upload),
            Err(reason) => {
                warn!(name = %upload.name, %reason, "batch member rejected");
                rejected.push(Rejected {
                    name: upload.name,
                    reason,
                });
            }
        }
    }

    (accepted, rejected)
}
