// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `hashmark config …`

use anyhow::Result;
use serde_json::json;

use crate::cli::{ConfigCommand, Context, Outcome};
use crate::output::emit;
use crate::settings::{config_path, load_config, persist_config};

pub fn run(ctx: Context, command: ConfigCommand) -> Result<Outcome> {
    match command {
        ConfigCommand::Show => {
            let value = json!({
                "path": config_path(&ctx.data_dir),
                "config": ctx.config,
            });
            // Settings are shown as JSON either way.
            emit(true, &value, |_| {})?;
        }
        ConfigCommand::SetOwner { address } => {
            // Start from the file, not the effective settings, so a one-off
            // --owner flag is never written back.
            let mut config = load_config(&ctx.data_dir)?;
            config.owner = Some(address.clone());
            persist_config(&ctx.data_dir, &config)?;
            emit(ctx.json, &json!({ "owner": address }), |_| {
                println!("Owner set to {address}");
            })?;
        }
    }
    Ok(Outcome::Success)
}
