// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hashmark command-line front end.
//
// Entry point. Initialises logging, parses arguments and runs one command.
// Exit status: 0 when the command succeeded (and any candidate verified),
// 1 on error, 2 when a candidate did not verify.

mod cli;
mod commands;
mod data_dir;
mod output;
mod settings;

use clap::Parser;
use hashmark_core::error::HashmarkError;
use hashmark_core::human_errors::humanize_error;

use crate::cli::{Cli, Outcome};

const EXIT_ERROR: i32 = 1;
const EXIT_MISMATCH: i32 = 2;

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<HashmarkError>() {
        Some(known) => {
            let human = humanize_error(known);
            eprintln!("hashmark: {}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %format!("{err:#}"), severity = ?human.severity, "command failed");
        }
        None => eprintln!("hashmark error: {err:#}"),
    }
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so that `--json` output on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.run().await {
        Ok(Outcome::Success) => {}
        Ok(Outcome::Mismatch) => std::process::exit(EXIT_MISMATCH),
        Err(err) => {
            report(&err);
            std::process::exit(EXIT_ERROR);
        }
    }
}
