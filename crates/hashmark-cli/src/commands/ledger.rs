// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `hashmark ledger …`: publishing, verification by lookup, and browsing.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use hashmark_core::error::HashmarkError;
use hashmark_core::types::{Claim, DocumentId, KnownDigest, LedgerDocument};
use hashmark_document::{Rejected, Upload, validate_title};
use hashmark_ledger::LedgerGateway;
use hashmark_verify::{LedgerReport, Reference, Verification};
use serde_json::json;
use tracing::info;

use crate::cli::{Context, LedgerCommand, Outcome};
use crate::output::{describe_failure, emit, print_file, print_verdict};

pub async fn run(ctx: &Context, command: LedgerCommand) -> Result<Outcome> {
    match command {
        LedgerCommand::Publish { path, title } => publish(ctx, &path, &title).await,
        LedgerCommand::PublishBatch { paths, title } => publish_batch(ctx, &paths, &title).await,
        LedgerCommand::Update { id, title, file } => update(ctx, DocumentId(id), &title, file.as_deref()).await,
        LedgerCommand::Retire { id } => retire(ctx, DocumentId(id)).await,
        LedgerCommand::Verify { paths, against: Some(id) } => {
            let [path] = paths.as_slice() else {
                bail!("--against compares exactly one file, got {}", paths.len());
            };
            verify_against_document(ctx, path, DocumentId(id)).await
        }
        LedgerCommand::Verify { paths, against: None } => verify_lookup(ctx, &paths).await,
        LedgerCommand::Show { id } => show(ctx, DocumentId(id)).await,
        LedgerCommand::List { page } => list(ctx, page).await,
    }
}

/// Writes need an owner; check that and the title before touching any file.
fn writer(ctx: &Context, title: &str) -> Result<Claim> {
    let claim = ctx.claim().ok_or(HashmarkError::Unauthorized)?;
    validate_title(title, ctx.config.title_max_chars)?;
    Ok(claim)
}

fn print_document(document: &LedgerDocument) {
    let state = if document.is_active() { "active" } else { "retired" };
    println!("#{}  {}  [{state}]", document.id, document.name);
    println!("  file:   {}", document.file_name);
    println!("  digest: {}", document.digest);
    println!("  owner:  {}", document.owner);
}

async fn publish(ctx: &Context, path: &Path, title: &str) -> Result<Outcome> {
    let claim = writer(ctx, title)?;
    let upload = Upload::from_path(path, ctx.config.publish.max_size)?;
    let published = ctx.publisher()?.publish(Some(&claim), title, upload).await?;

    emit(ctx.json, &published, |published| {
        println!("Published as document #{}", published.id);
        print_file("File", &published.record.name, Some(published.record.size), &published.record.digest);
    })?;
    Ok(Outcome::Success)
}

fn skipped_json(skipped: &[Rejected]) -> serde_json::Value {
    skipped
        .iter()
        .map(|r| json!({ "name": r.name, "reason": r.reason.to_string() }))
        .collect()
}

async fn publish_batch(ctx: &Context, paths: &[PathBuf], title: &str) -> Result<Outcome> {
    let claim = writer(ctx, title)?;

    // Files that cannot even be read join the batch's own skip list.
    let mut uploads = Vec::with_capacity(paths.len());
    let mut unreadable = Vec::new();
    for path in paths {
        match Upload::from_path(path, ctx.config.publish.max_size) {
            Ok(upload) => uploads.push(upload),
            Err(reason) => unreadable.push(Rejected {
                name: path.display().to_string(),
                reason,
            }),
        }
    }

    let (published, skipped) = if uploads.is_empty() {
        (Vec::new(), unreadable)
    } else {
        let receipt = ctx.publisher()?.publish_batch(Some(&claim), title, uploads).await?;
        let mut skipped = unreadable;
        skipped.extend(receipt.skipped);
        (receipt.published, skipped)
    };
    info!(published = published.len(), skipped = skipped.len(), "batch finished");

    let value = json!({ "published": published, "skipped": skipped_json(&skipped) });
    emit(ctx.json, &value, |_| {
        for item in &published {
            println!("#{}  {}  {}", item.id, item.record.digest.abbreviated(8), item.record.name);
        }
        for rejected in &skipped {
            println!("skipped {}: {}", rejected.name, describe_failure(&rejected.reason));
        }
        println!("{} published, {} skipped", published.len(), skipped.len());
    })?;

    Ok(if published.is_empty() {
        Outcome::Mismatch
    } else {
        Outcome::Success
    })
}

async fn update(ctx: &Context, id: DocumentId, title: &str, file: Option<&Path>) -> Result<Outcome> {
    let claim = writer(ctx, title)?;
    let upload = file
        .map(|path| Upload::from_path(path, ctx.config.publish.max_size))
        .transpose()?;
    let change = ctx.publisher()?.revise(Some(&claim), id, title, upload).await?;

    emit(ctx.json, &change, |change| {
        if change.is_noop() {
            println!("Document #{id} already up to date");
            return;
        }
        println!("Document #{id} updated");
        if let Some(name) = &change.name {
            println!("  title:  {name}");
        }
        if let (Some(file_name), Some(digest)) = (&change.file_name, &change.digest) {
            println!("  file:   {file_name}");
            println!("  digest: {digest}");
        }
    })?;
    Ok(Outcome::Success)
}

async fn retire(ctx: &Context, id: DocumentId) -> Result<Outcome> {
    let claim = ctx.claim();
    ctx.publisher()?.retire(claim.as_ref(), id).await?;
    emit(ctx.json, &json!({ "retired": id }), |_| {
        println!("Document #{id} retired; it will no longer verify");
    })?;
    Ok(Outcome::Success)
}

fn print_lookup(report: &LedgerReport) {
    print_file("Candidate", &report.candidate.name, Some(report.candidate.size), &report.candidate.digest);
    if report.matched_ids.is_empty() {
        println!("NOT VERIFIED: no record of this document on the ledger.");
        return;
    }
    println!("AUTHENTIC: recorded on the ledger {} time(s).", report.matched_ids.len());
    for document in &report.documents {
        print_document(document);
    }
    for missing in &report.unresolved {
        println!("#{}  (could not be read: {})", missing.id, missing.reason);
    }
}

async fn verify_lookup(ctx: &Context, paths: &[PathBuf]) -> Result<Outcome> {
    let verifier = ctx.verifier()?;
    let limit = ctx.config.ledger_lookup.max_size;

    if let [path] = paths {
        let report = verifier.verify_against_ledger(Upload::from_path(path, limit)?).await?;
        emit(ctx.json, &report, print_lookup)?;
        return Ok(if report.overall_match {
            Outcome::Success
        } else {
            Outcome::Mismatch
        });
    }

    let mut uploads = Vec::with_capacity(paths.len());
    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        match Upload::from_path(path, limit) {
            Ok(upload) => uploads.push(upload),
            Err(err) => results.push((path.display().to_string(), Err(err))),
        }
    }
    if !uploads.is_empty() {
        for item in verifier.verify_many_against_ledger(uploads).await? {
            results.push((item.name, item.outcome));
        }
    }

    let all_matched = results
        .iter()
        .all(|(_, outcome)| outcome.as_ref().is_ok_and(|report| report.overall_match));

    let value: serde_json::Value = results
        .iter()
        .map(|(name, outcome)| match outcome {
            Ok(report) => json!({ "name": name, "report": report }),
            Err(err) => json!({ "name": name, "error": err.to_string() }),
        })
        .collect();
    emit(ctx.json, &value, |_| {
        for (name, outcome) in &results {
            println!("== {name}");
            match outcome {
                Ok(report) => print_lookup(report),
                Err(err) => println!("could not verify: {}", describe_failure(err)),
            }
        }
    })?;

    Ok(if all_matched {
        Outcome::Success
    } else {
        Outcome::Mismatch
    })
}

/// Flow B with the reference taken from a ledger document's recorded
/// fingerprint and file name.
async fn verify_against_document(ctx: &Context, path: &Path, id: DocumentId) -> Result<Outcome> {
    let document = ctx.ledger()?.read_by_id(id).await?;
    let known = KnownDigest::from(&document);
    let upload = Upload::from_path(path, ctx.config.known.max_size)?;
    let verification = ctx.verifier()?.verify(upload, Reference::Known(known)).await?;

    emit(ctx.json, &verification, |verification| {
        if let Verification::Known(report) = verification {
            print_document(&document);
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

async fn show(ctx: &Context, id: DocumentId) -> Result<Outcome> {
    let document = ctx.ledger()?.read_by_id(id).await?;
    emit(ctx.json, &document, print_document)?;
    Ok(Outcome::Success)
}

async fn list(ctx: &Context, page: u32) -> Result<Outcome> {
    let Some(owner) = &ctx.config.owner else {
        bail!("no owner address configured; pass --owner or run `hashmark config set-owner`");
    };
    let page = ctx.catalogue()?.owner_page(owner, page).await?;

    emit(ctx.json, &page, |page| {
        if page.total == 0 {
            println!("No documents published by {owner}.");
            return;
        }
        for document in &page.documents {
            let state = if document.is_active() { "" } else { "  (retired)" };
            println!(
                "#{}  {}  {}  {}{state}",
                document.id,
                document.digest.abbreviated(8),
                document.file_name,
                document.name
            );
        }
        for missing in &page.unresolved {
            println!("#{}  (could not be read: {})", missing.id, missing.reason);
        }
        println!(
            "page {} of {} ({} documents)",
            page.page,
            page.total_pages.max(1),
            page.total
        );
    })?;
    Ok(Outcome::Success)
}
