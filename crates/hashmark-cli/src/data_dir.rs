// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Data directory resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Overrides every other location when set.
pub const DATA_DIR_ENV: &str = "HASHMARK_DATA_DIR";

/// Return the application data directory, creating it if needed.
///
/// `explicit` (the `--data-dir` flag) wins, then `HASHMARK_DATA_DIR`, then
/// the XDG data directory, then `~/.local/share`.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => resolve(|key| std::env::var(key).ok()),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create data directory {}", dir.display()))?;
    Ok(dir)
}

fn resolve(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = var(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let base = if let Some(xdg) = var("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        PathBuf::from(xdg)
    } else if let Some(home) = var("HOME") {
        PathBuf::from(home).join(".local").join("share")
    } else {
        // Last resort
        std::env::temp_dir()
    };
    base.join("hashmark")
}
