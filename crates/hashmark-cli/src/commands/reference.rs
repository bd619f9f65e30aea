// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `hashmark reference …`: locally stored reference fingerprints.

use std::path::Path;

use anyhow::Result;
use hashmark_core::types::ReferenceId;
use hashmark_document::{IntakeRules, Upload};
use hashmark_verify::{Reference, ReferenceStore, Verification, fingerprint};
use serde_json::json;

use crate::cli::{Context, Outcome, ReferenceCommand};
use crate::output::{emit, print_file, print_verdict};

pub async fn run(ctx: &Context, command: ReferenceCommand) -> Result<Outcome> {
    match command {
        ReferenceCommand::Add { path, label } => add(ctx, &path, &label).await,
        ReferenceCommand::List => list(ctx, &ctx.references()?),
        ReferenceCommand::Remove { id } => remove(ctx, &ctx.references()?, id),
        ReferenceCommand::Verify { id, candidate } => verify(ctx, id, &candidate).await,
    }
}

async fn add(ctx: &Context, path: &Path, label: &str) -> Result<Outcome> {
    let rules: IntakeRules = ctx.config.stored.into();
    let upload = Upload::from_path(path, ctx.config.stored.max_size)?;
    let record = fingerprint(Some(upload), &rules).await?;
    let stored = ctx.references()?.insert(label, record)?;

    emit(ctx.json, &stored, |stored| {
        println!("Stored reference {} ({})", stored.id, stored.label);
        print_file("File", &stored.record.name, Some(stored.record.size), &stored.record.digest);
    })?;
    Ok(Outcome::Success)
}

fn list(ctx: &Context, store: &ReferenceStore) -> Result<Outcome> {
    let references = store.list()?;
    emit(ctx.json, &references, |references| {
        if references.is_empty() {
            println!("No stored references.");
        }
        for reference in references {
            println!(
                "{}  {}  {}  {}",
                reference.id,
                reference.record.digest.abbreviated(8),
                reference.record.name,
                reference.label
            );
        }
    })?;
    Ok(Outcome::Success)
}

fn remove(ctx: &Context, store: &ReferenceStore, id: ReferenceId) -> Result<Outcome> {
    store.delete(id)?;
    emit(ctx.json, &json!({ "removed": id }), |_| println!("Removed reference {id}"))?;
    Ok(Outcome::Success)
}

async fn verify(ctx: &Context, id: ReferenceId, candidate: &Path) -> Result<Outcome> {
    let upload = Upload::from_path(candidate, ctx.config.stored.max_size)?;
    let verification = ctx.verifier()?.verify(upload, Reference::Stored(id)).await?;

    emit(ctx.json, &verification, |verification| {
        if let Verification::Stored(report) = verification {
            println!("Reference: {} ({})", report.reference.label, report.reference.id);
            print_file(
                "  file",
                &report.reference.record.name,
                Some(report.reference.record.size),
                &report.reference.record.digest,
            );
            print_file("Candidate", &report.candidate.name, Some(report.candidate.size), &report.candidate.digest);
            print_verdict(&report.verdict);
        }
    })?;

    Ok(if verification.overall_match() {
        Outcome::Success
    } else {
        Outcome::Mismatch
    })
}

#[cfg(test)]
mod tests {
    use hashmark_core::config::AppConfig;

    use super::*;

    fn context(dir: &Path) -> Context {
        Context {
            data_dir: dir.to_path_buf(),
            config: AppConfig::default(),
            json: true,
        }
    }

    #[tokio::test]
    async fn added_reference_verifies_its_own_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let ctx = context(tmp.path());
        let file = tmp.path().join("contract.pdf");
        std::fs::write(&file, b"%PDF-1.4 contract").expect("write");

        add(&ctx, &file, "Contract").await.expect("add");
        let stored = ctx.references().expect("store").list().expect("list");
        assert_eq!(stored.len(), 1);

        let outcome = verify(&ctx, stored[0].id, &file).await.expect("verify");
        assert_eq!(outcome, Outcome::Success);

        std::fs::write(&file, b"%PDF-1.4 contracT").expect("tamper");
        let outcome = verify(&ctx, stored[0].id, &file).await.expect("verify");
        assert_eq!(outcome, Outcome::Mismatch);
    }
}
