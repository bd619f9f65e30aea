// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — header sniffing and structural inspection.

pub mod inspect;

pub use inspect::{PdfSummary, inspect, sniff_pdf};
