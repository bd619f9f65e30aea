// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `hashmark digest`: fingerprint files without recording anything.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use hashmark_core::types::FileDigest;
use hashmark_document::{PdfSummary, inspect};
use hashmark_integrity::{digest_bytes, digest_file};
use serde::Serialize;
use tracing::warn;

use crate::cli::{Context, Outcome};
use crate::output::emit;

#[derive(Debug, Serialize)]
struct DigestLine {
    path: PathBuf,
    digest: FileDigest,
    size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pdf: Option<PdfSummary>,
}

/// With `inspect_pdf` the file is read once and both the digest and the PDF
/// summary come from that buffer; otherwise it is streamed.
fn digest_one(path: &Path, inspect_pdf: bool) -> Result<DigestLine> {
    if !inspect_pdf {
        let (digest, size) = digest_file(path, None)
            .with_context(|| format!("cannot fingerprint {}", path.display()))?;
        return Ok(DigestLine {
            path: path.to_path_buf(),
            digest,
            size,
            pdf: None,
        });
    }

    let bytes = std::fs::read(path).with_context(|| format!("cannot fingerprint {}", path.display()))?;
    let pdf = match inspect(&bytes) {
        Ok(summary) => Some(summary),
        Err(err) => {
            warn!(path = %path.display(), %err, "not inspectable as PDF");
            None
        }
    };

    Ok(DigestLine {
        path: path.to_path_buf(),
        digest: digest_bytes(&bytes),
        size: bytes.len() as u64,
        pdf,
    })
}

/// Print `0x…  path` for each file, like `sha256sum`.
pub fn run_digest(ctx: &Context, paths: &[PathBuf], inspect_pdf: bool) -> Result<Outcome> {
    let lines = paths
        .iter()
        .map(|path| digest_one(path, inspect_pdf))
        .collect::<Result<Vec<_>>>()?;

    emit(ctx.json, &lines, |lines| {
        for line in lines {
            match &line.pdf {
                Some(pdf) => println!(
                    "{}  {}  (PDF {}, {} pages)",
                    line.digest,
                    line.path.display(),
                    pdf.version,
                    pdf.page_count
                ),
                None => println!("{}  {}", line.digest, line.path.display()),
            }
        }
    })?;
    Ok(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_matches_content_hash() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("note.txt");
        std::fs::write(&path, b"hello").expect("write");

        let line = digest_one(&path, true).expect("digest");
        assert_eq!(line.digest, digest_bytes(b"hello"));
        assert_eq!(line.size, 5);
        assert!(line.pdf.is_none());
    }

    #[test]
    fn inspect_does_not_change_the_fingerprint() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("data.bin");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).expect("write");

        let streamed = digest_one(&path, false).expect("streamed");
        let buffered = digest_one(&path, true).expect("buffered");
        assert_eq!(streamed.digest, buffered.digest);
        assert_eq!(streamed.size, buffered.size);
        assert_eq!(buffered.size, content.len() as u64);
        assert_eq!(buffered.digest, digest_bytes(&content));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        assert!(digest_one(&tmp.path().join("absent.pdf"), false).is_err());
    }
}
