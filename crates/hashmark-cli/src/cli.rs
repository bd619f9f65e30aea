// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Argument parsing and the shared command context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hashmark_core::config::AppConfig;
use hashmark_core::types::{Claim, FileDigest, OwnerAddress, ReferenceId};
use hashmark_integrity::AuditLog;
use hashmark_ledger::{ResilientLedger, SqliteLedger};
use hashmark_verify::{AuditTrail, Catalogue, Publisher, ReferenceStore, Verifier, VerifierConfig};

use crate::commands;
use crate::data_dir::data_dir;
use crate::settings::load_config;

pub const AUDIT_DB: &str = "audit.db";
const LEDGER_DB: &str = "ledger.db";
const REFERENCES_DB: &str = "references.db";

/// The ledger the CLI talks to: a local SQLite ledger behind timeouts and retries.
pub type CliLedger = ResilientLedger<SqliteLedger>;

/// Hashmark: fingerprint PDF records, publish them, and verify copies.
#[derive(Debug, Parser)]
#[command(name = "hashmark", version)]
#[command(about = "Fingerprint PDF records, publish them to a ledger, and verify copies", long_about = None)]
pub struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory (defaults to $HASHMARK_DATA_DIR, then the XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Owner address to publish as, overriding the configured one.
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub owner: Option<OwnerAddress>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the SHA-256 fingerprint of one or more files.
    Digest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Also show the page count and version of PDFs.
        #[arg(long)]
        inspect: bool,
    },

    /// Compare two files: is the candidate the same document as the reference?
    Compare { reference: PathBuf, candidate: PathBuf },

    /// Manage locally stored reference fingerprints.
    #[command(subcommand)]
    Reference(ReferenceCommand),

    /// Publish to and verify against the ledger.
    #[command(subcommand)]
    Ledger(LedgerCommand),

    /// Show recent audit trail entries.
    Audit {
        #[arg(long, default_value = "20", value_name = "N")]
        limit: u32,
        /// Only entries for this fingerprint, oldest first.
        #[arg(long, value_name = "DIGEST")]
        digest: Option<FileDigest>,
    },

    /// Show or change settings.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum ReferenceCommand {
    /// Fingerprint a file and keep it as a reference.
    Add {
        path: PathBuf,
        #[arg(long)]
        label: String,
    },
    /// List stored references, newest first.
    List,
    /// Forget a stored reference.
    Remove { id: ReferenceId },
    /// Verify a candidate file against a stored reference.
    Verify { id: ReferenceId, candidate: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum LedgerCommand {
    /// Record one file on the ledger under a title.
    Publish {
        path: PathBuf,
        #[arg(long)]
        title: String,
    },
    /// Record several files under one shared title.
    PublishBatch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(long)]
        title: String,
    },
    /// Change the title and/or replace the file of a document you own.
    Update {
        id: u64,
        #[arg(long)]
        title: String,
        /// Replacement file.
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Retire a document you own so it no longer verifies.
    Retire { id: u64 },
    /// Look candidate files up on the ledger by fingerprint.
    Verify {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Compare one file against this document's recorded fingerprint
        /// and file name instead.
        #[arg(long, value_name = "ID")]
        against: Option<u64>,
    },
    /// Show one document.
    Show { id: u64 },
    /// List documents published by the owner, one page at a time.
    List {
        #[arg(long, default_value = "1")]
        page: u32,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective settings.
    Show,
    /// Remember an owner address for publishing and listing.
    SetOwner { address: OwnerAddress },
}

/// What a finished command tells the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The command ran but the answer is no: a candidate did not verify,
    /// or nothing could be published.
    Mismatch,
}

/// Everything a command needs: where data lives, what the settings are, and
/// how to print.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: AppConfig,
    pub json: bool,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let data_dir = data_dir(cli.data_dir.as_deref())?;
        let mut config = load_config(&data_dir)?;
        if let Some(owner) = &cli.owner {
            config.owner = Some(owner.clone());
        }
        tracing::debug!(data_dir = %data_dir.display(), ?config, "context loaded");
        Ok(Self {
            data_dir,
            config,
            json: cli.json,
        })
    }

    pub fn claim(&self) -> Option<Claim> {
        self.config.owner.clone().map(Claim::for_owner)
    }

    pub fn audit(&self) -> Result<AuditTrail> {
        if !self.config.audit_enabled {
            return Ok(AuditTrail::detached());
        }
        Ok(AuditTrail::attach(AuditLog::open(self.data_dir.join(AUDIT_DB))?))
    }

    pub fn ledger(&self) -> Result<Arc<CliLedger>> {
        let local = SqliteLedger::open(self.data_dir.join(LEDGER_DB))?;
        Ok(Arc::new(ResilientLedger::from_config(local, &self.config.ledger)))
    }

    pub fn references(&self) -> Result<ReferenceStore> {
        Ok(ReferenceStore::open(self.data_dir.join(REFERENCES_DB))?)
    }

    pub fn verifier(&self) -> Result<Verifier<CliLedger, ReferenceStore>> {
        let verifier = Verifier::new(
            self.ledger()?,
            self.references()?,
            VerifierConfig::from(&self.config),
        );
        Ok(verifier.with_audit(self.audit()?))
    }

    pub fn publisher(&self) -> Result<Publisher<CliLedger>> {
        Ok(Publisher::new(self.ledger()?, &self.config).with_audit(self.audit()?))
    }

    pub fn catalogue(&self) -> Result<Catalogue<CliLedger>> {
        Ok(Catalogue::with_page_size(self.ledger()?, self.config.page_size))
    }
}

impl Cli {
    pub async fn run(self) -> Result<Outcome> {
        let ctx = Context::load(&self)?;

        match self.command {
            Command::Digest { paths, inspect } => commands::digest::run_digest(&ctx, &paths, inspect),
            Command::Compare { reference, candidate } => {
                commands::compare::run_compare(&ctx, &reference, &candidate).await
            }
            Command::Reference(command) => commands::reference::run(&ctx, command).await,
            Command::Ledger(command) => commands::ledger::run(&ctx, command).await,
            Command::Audit { limit, digest } => commands::audit::run_audit(&ctx, limit, digest.as_ref()),
            Command::Config(command) => commands::config::run(ctx, command),
        }
    }
}
