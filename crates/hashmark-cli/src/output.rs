// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printing helpers shared by the commands.

use anyhow::Result;
use hashmark_core::error::HashmarkError;
use hashmark_core::human_errors::{format_size, humanize_error};
use hashmark_core::types::ComparisonVerdict;
use serde::Serialize;

/// Print `value` as pretty JSON when `json` is set, otherwise run `text`.
pub fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// The per-field breakdown shown after every comparison.
pub fn print_verdict(verdict: &ComparisonVerdict) {
    println!("  name matches:   {}", yes_no(verdict.name_match));
    match verdict.size_match {
        Some(matched) => println!("  size matches:   {}", yes_no(matched)),
        None => println!("  size matches:   (not checked)"),
    }
    println!("  digest matches: {}", yes_no(verdict.digest_match));
    println!(
        "{}",
        if verdict.overall_match {
            "AUTHENTIC: the document matches its reference."
        } else {
            "NOT VERIFIED: the document does not match its reference."
        }
    );
}

pub fn print_file(label: &str, name: &str, size: Option<u64>, digest: &impl std::fmt::Display) {
    match size {
        Some(size) => println!("{label}: {name} ({})", format_size(size)),
        None => println!("{label}: {name}"),
    }
    println!("  {digest}");
}

/// Plain-language rendering of a per-file failure inside a batch.
pub fn describe_failure(err: &HashmarkError) -> String {
    let human = humanize_error(err);
    format!("{} {}", human.message, human.suggestion)
}
