// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document integrity — SHA-256 fingerprints of file content.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use hashmark_core::error::{HashmarkError, Result};
use hashmark_core::types::FileDigest;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Read size for streamed digests.
const CHUNK_SIZE: usize = 64 * 1024;

fn finish(hasher: Sha256) -> FileDigest {
    let mut bytes = [0u8; FileDigest::LEN];
    bytes.copy_from_slice(&hasher.finalize());
    FileDigest::from_bytes(bytes)
}

/// Compute the SHA-256 fingerprint of `data`.
///
/// Depends on nothing but the bytes: file names, timestamps, and upload
/// sessions never enter the hash.
pub fn digest_bytes(data: &[u8]) -> FileDigest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    finish(hasher)
}

/// Stream `reader` to the end and return its fingerprint and byte count.
///
/// With a `ceiling`, reading stops as soon as more than `ceiling` bytes have
/// been seen and `FileTooLarge` is returned; a truncated digest is never
/// produced. The reported size is then the number of bytes read so far.
/// `name` is only used for errors and logs.
#[instrument(skip(reader))]
pub fn digest_reader<R: Read>(name: &str, mut reader: R, ceiling: Option<u64>) -> Result<(FileDigest, u64)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total: u64 = 0;

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(HashmarkError::ReadError(e)),
        };

        total += read as u64;
        if let Some(limit) = ceiling {
            if total > limit {
                return Err(HashmarkError::FileTooLarge {
                    name: name.to_owned(),
                    size: total,
                    limit,
                });
            }
        }
        hasher.update(&buf[..read]);
    }

    debug!(bytes = total, "digest complete");
    Ok((finish(hasher), total))
}

/// Fingerprint a file on disk.
///
/// The file's metadata is checked against `ceiling` before any byte is
/// hashed, so an oversized file is rejected without being read.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn digest_file(path: impl AsRef<Path>, ceiling: Option<u64>) -> Result<(FileDigest, u64)> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file = File::open(path)?;
    let declared = file.metadata()?.len();
    if let Some(limit) = ceiling {
        if declared > limit {
            return Err(HashmarkError::FileTooLarge {
                name,
                size: declared,
                limit,
            });
        }
    }

    digest_reader(&name, io::BufReader::new(file), ceiling)
}

/// Check that `data` hashes to `expected`.
///
/// Returns `Err(HashmarkError::IntegrityMismatch)` with both digests in
/// canonical form when it does not.
pub fn verify_digest(data: &[u8], expected: &FileDigest) -> Result<()> {
    let actual = digest_bytes(data);
    if actual == *expected {
        Ok(())
    } else {
        Err(HashmarkError::IntegrityMismatch {
            expected: expected.to_hex(),
            actual: actual.to_hex(),
        })
    }
}
