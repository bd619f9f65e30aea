// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// hashmark-document — Document intake for Hashmark.
//
// Validates uploads before any fingerprinting work starts (presence, declared
// media type, size ceiling, record title) and inspects PDFs for display.

pub mod intake;
pub mod pdf;

pub use intake::{IntakeRules, Rejected, Upload, partition_batch, validate, validate_title};
pub use pdf::inspect::{PdfSummary, inspect, sniff_pdf};
