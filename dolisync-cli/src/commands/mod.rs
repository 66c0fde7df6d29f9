//! Subcommand implementations.

pub mod bulletin;
pub mod config;
pub mod import;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use dolisync_core::{config as core_config, Config};

/// Path of the config file in use: `--config` if given, else the default.
pub(crate) fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => {
            let home = core_config::home()?;
            Ok(core_config::config_path_at(&home))
        }
    }
}

/// File (if any) + environment overrides, not yet validated.
pub(crate) fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let loaded = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            tracing::debug!(path = %path.display(), "loading configuration");
            core_config::load_from(path)
        }
        None => core_config::load(),
    };
    let mut config = loaded.context("failed to load configuration")?;
    config
        .apply_process_env()
        .context("invalid environment override")?;
    Ok(config)
}

/// Like [`resolve_config`] but refuses settings no remote call could use.
pub(crate) fn connection_config(explicit: Option<&Path>) -> Result<Config> {
    let config = resolve_config(explicit)?;
    config
        .validate()
        .context("configuration is incomplete; run `dolisync config init` first")?;
    Ok(config)
}
