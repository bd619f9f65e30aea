// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `hashmark compare`: pairwise verification of two files.

use std::path::Path;

use anyhow::Result;
use hashmark_document::Upload;

use crate::cli::{Context, Outcome};
use crate::output::{emit, print_file, print_verdict};

pub async fn run_compare(ctx: &Context, reference: &Path, candidate: &Path) -> Result<Outcome> {
    let limit = ctx.config.compare.max_size;
    let reference = Upload::from_path(reference, limit)?;
    let candidate = Upload::from_path(candidate, limit)?;

    let report = ctx.verifier()?.compare_pair(reference, candidate).await?;

    emit(ctx.json, &report, |report| {
        print_file("Reference", &report.reference.name, Some(report.reference.size), &report.reference.digest);
        print_file("Candidate", &report.candidate.name, Some(report.candidate.size), &report.candidate.digest);
        print_verdict(&report.verdict);
    })?;

    Ok(if report.verdict.overall_match {
        Outcome::Success
    } else {
        Outcome::Mismatch
    })
}
