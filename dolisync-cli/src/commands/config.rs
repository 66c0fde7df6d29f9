//! `dolisync config`: show or create the configuration file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use serde::Serialize;

use dolisync_core::{config as core_config, Config};

use super::{config_file, resolve_config};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (file plus environment).
    Show {
        /// Emit JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with defaults and the given values.
    Init {
        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        api_key: Option<String>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub fn run(command: ConfigCommand, config_path: Option<&Path>) -> Result<()> {
    match command {
        ConfigCommand::Show { json } => show(config_path, json),
        ConfigCommand::Init {
            base_url,
            api_key,
            force,
        } => init(config_path, base_url, api_key, force),
    }
}

/// Same shape as [`Config`] with the key masked.
#[derive(Serialize)]
struct ShownConfig<'a> {
    path: String,
    base_url: &'a str,
    api_key: String,
    timeout_secs: u64,
    bulletin: &'a core_config::BulletinConfig,
}

fn show(config_path: Option<&Path>, json: bool) -> Result<()> {
    let path = config_file(config_path)?;
    let config = resolve_config(config_path)?;
    let shown = ShownConfig {
        path: path.display().to_string(),
        base_url: &config.api.base_url,
        api_key: config.api.masked_api_key(),
        timeout_secs: config.api.timeout_secs,
        bulletin: &config.bulletin,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&shown).context("failed to serialize configuration")?
        );
        return Ok(());
    }

    println!("config file:   {}", shown.path);
    println!("base_url:      {}", shown.base_url);
    println!("api_key:       {}", shown.api_key);
    println!("timeout_secs:  {}", shown.timeout_secs);
    println!("bulletin:");
    println!("  label:       {}", shown.bulletin.label);
    println!("  subject:     {}", shown.bulletin.subject);
    println!("  body:        {}", shown.bulletin.body);
    println!("  email_from:  {}", shown.bulletin.email_from);

    if let Err(err) = config.validate() {
        println!("warning: {err}");
    }
    Ok(())
}

fn init(
    config_path: Option<&Path>,
    base_url: Option<String>,
    api_key: Option<String>,
    force: bool,
) -> Result<()> {
    let path = config_file(config_path)?;
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }

    let mut config = Config::default();
    if let Some(base_url) = base_url {
        config.api.base_url = base_url;
    }
    if let Some(api_key) = api_key {
        config.api.api_key = api_key;
    }
    core_config::save_to(&path, &config)
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("✓ wrote {}", path.display());
    if config.api.api_key.is_empty() {
        println!("  api_key is empty; set it in the file or via DOLIBARR_API_KEY");
    }
    Ok(())
}
