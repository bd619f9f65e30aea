// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF inspection — header sniffing and page/version summary using `lopdf`.
//
// Inspection is informational. The fingerprint is always taken over the raw
// bytes, never over a parsed or re-serialised document.

use hashmark_core::error::HashmarkError;
use lopdf::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Every PDF file starts with this marker.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// What a table row or report shows about a PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfSummary {
    pub page_count: usize,
    /// Header version, e.g. `"1.7"`.
    pub version: String,
}

/// Whether `data` starts with the PDF header.
pub fn sniff_pdf(data: &[u8]) -> bool {
    data.starts_with(PDF_MAGIC)
}

/// Parse `data` as a PDF and summarise it.
#[instrument(skip_all, fields(bytes_len = data.len()))]
pub fn inspect(data: &[u8]) -> Result<PdfSummary, HashmarkError> {
    if !sniff_pdf(data) {
        return Err(HashmarkError::PdfError("missing %PDF- header".into()));
    }

    let document = Document::load_mem(data)
        .map_err(|err| HashmarkError::PdfError(format!("failed to load PDF: {err}")))?;

    let summary = PdfSummary {
        page_count: document.get_pages().len(),
        version: document.version.clone(),
    };
    debug!(pages = summary.page_count, version = %summary.version, "PDF inspected");
    Ok(summary)
}
