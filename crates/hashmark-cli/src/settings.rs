// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading and saving `config.json` in the data directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hashmark_core::config::AppConfig;
use tracing::{debug, info};

const CONFIG_FILE: &str = "config.json";

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read the configuration, falling back to defaults when no file exists.
/// A file that exists but does not parse or validate is an error.
pub fn load_config(data_dir: &Path) -> Result<AppConfig> {
    let path = config_path(data_dir);
    let config = match std::fs::read_to_string(&path) {
        Ok(data) => serde_json::from_str(&data)
            .with_context(|| format!("cannot parse {}", path.display()))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            AppConfig::default()
        }
        Err(err) => {
            return Err(err).with_context(|| format!("cannot read {}", path.display()));
        }
    };
    config.validate()?;
    Ok(config)
}

pub fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    config.validate()?;
    let path = config_path(data_dir);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
    info!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use hashmark_core::types::OwnerAddress;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = load_config(tmp.path()).expect("load");
        assert_eq!(config.page_size, AppConfig::default().page_size);
        assert!(config.owner.is_none());
    }

    #[test]
    fn saved_config_is_loaded_back() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.page_size = 25;
        config.owner = Some(OwnerAddress::parse(&format!("0x{}", "ab".repeat(20))).expect("address"));
        persist_config(tmp.path(), &config).expect("persist");

        let back = load_config(tmp.path()).expect("load");
        assert_eq!(back.page_size, 25);
        assert_eq!(back.owner, config.owner);
    }

    #[test]
    fn invalid_settings_are_refused() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.page_size = 0;
        assert!(persist_config(tmp.path(), &config).is_err());

        std::fs::write(config_path(tmp.path()), "{ not json").expect("write");
        assert!(load_config(tmp.path()).is_err());
    }
}
