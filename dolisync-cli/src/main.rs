//! dolisync: Dolibarr contact import and bulletin dispatch CLI.
//!
//! # Usage
//!
//! ```text
//! dolisync import <file.json> [--dry-run] [--json]
//! dolisync bulletin [--flag clima_bulletin|forecast_bulletin] [--dry-run] [--json]
//! dolisync config show
//! dolisync config init [--base-url <url>] [--api-key <key>] [--force]
//! ```
//!
//! Every subcommand accepts `--config <path>`; the default is
//! `~/.dolisync/config.yaml`. `DOLIBARR_BASE_URL`, `DOLIBARR_API_KEY` and
//! `DOLIBARR_TIMEOUT_SECS` override the file.

mod commands;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{bulletin::BulletinArgs, config::ConfigCommand, import::ImportArgs};
use dolisync_core::ExtraKey;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dolisync",
    version,
    about = "Reconcile contacts into Dolibarr and send the bulletin",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.dolisync/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update Dolibarr contacts from a JSON file.
    Import(ImportArgs),

    /// Send the bulletin to every contact with the flag set.
    Bulletin(BulletinArgs),

    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Bulletin flag argument
// ---------------------------------------------------------------------------

/// Thin wrapper so clap only accepts the subscription flags.
#[derive(Debug, Clone, Copy)]
pub struct FlagArg(pub ExtraKey);

impl Default for FlagArg {
    fn default() -> Self {
        Self(ExtraKey::ClimaBulletin)
    }
}

impl FromStr for FlagArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<ExtraKey>() {
            Ok(key) if key.is_flag() => Ok(Self(key)),
            _ => Err(format!(
                "unknown bulletin flag '{s}'; expected: clima_bulletin, forecast_bulletin"
            )),
        }
    }
}

impl fmt::Display for FlagArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<FlagArg> for ExtraKey {
    fn from(f: FlagArg) -> Self {
        f.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Import(args) => args.run(config_path),
        Commands::Bulletin(args) => args.run(config_path),
        Commands::Config { command } => commands::config::run(command, config_path),
    }
}

/// Diagnostics go to stderr so stdout stays parseable with `--json`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_arg_accepts_bulletin_flags_only() {
        assert_eq!(
            "forecast_bulletin".parse::<FlagArg>().unwrap().0,
            ExtraKey::ForecastBulletin
        );
        assert_eq!(
            "options_clima_bulletin".parse::<FlagArg>().unwrap().0,
            ExtraKey::ClimaBulletin
        );
        assert!("city".parse::<FlagArg>().is_err());
        assert!("weekly".parse::<FlagArg>().is_err());
    }

    #[test]
    fn cli_parses_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dolisync",
            "bulletin",
            "--flag",
            "forecast_bulletin",
            "--config",
            "/tmp/dolisync.yaml",
        ])
        .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/dolisync.yaml")));
        match cli.command {
            Commands::Bulletin(args) => assert_eq!(args.flag.0, ExtraKey::ForecastBulletin),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bulletin_flag_defaults_to_clima() {
        let cli = Cli::try_parse_from(["dolisync", "bulletin"]).expect("parse");
        match cli.command {
            Commands::Bulletin(args) => assert_eq!(args.flag.0, ExtraKey::ClimaBulletin),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
