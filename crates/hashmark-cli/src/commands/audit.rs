// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `hashmark audit`: read back the audit trail.

use anyhow::Result;
use hashmark_core::types::FileDigest;
use hashmark_integrity::AuditLog;

use crate::cli::{AUDIT_DB, Context, Outcome};
use crate::output::emit;

pub fn run_audit(ctx: &Context, limit: u32, digest: Option<&FileDigest>) -> Result<Outcome> {
    let log = AuditLog::open(ctx.data_dir.join(AUDIT_DB))?;
    let entries = match digest {
        Some(digest) => log.entries_for_digest(digest)?,
        None => log.recent_entries(limit)?,
    };

    emit(ctx.json, &entries, |entries| {
        if entries.is_empty() {
            println!("No audit entries.");
        }
        for entry in entries {
            let result = if entry.success { "ok" } else { "FAILED" };
            print!("{}  {:<14} {:<6} {}", entry.timestamp, entry.action, result, entry.document_digest);
            match &entry.details {
                Some(details) => println!("  {details}"),
                None => println!(),
            }
        }
    })?;
    Ok(Outcome::Success)
}
