//! `dolisync bulletin`: one campaign per subscribed contact.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use dolisync_client::DolibarrClient;
use dolisync_sync::{BulletinDispatcher, DispatchOutcome, DispatchReport};

use super::super::FlagArg;
use super::connection_config;

/// Arguments for `dolisync bulletin`.
#[derive(Args, Debug)]
pub struct BulletinArgs {
    /// Subscription flag selecting the recipients.
    #[arg(long, default_value_t = FlagArg::default())]
    pub flag: FlagArg,

    /// List the recipients without creating campaigns.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl BulletinArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = connection_config(config_path)?;
        let client = DolibarrClient::new(&config.api);

        let report = BulletinDispatcher::new(&client, &client, &config.bulletin)
            .dry_run(self.dry_run)
            .dispatch(self.flag.into())
            .with_context(|| format!("could not list contacts with {} set", self.flag))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .context("failed to serialize dispatch report")?
            );
            return Ok(());
        }

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &DispatchReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    if report.outcomes.is_empty() {
        println!("{prefix}No contacts have {} set.", report.flag);
        return;
    }

    for outcome in &report.outcomes {
        match outcome {
            DispatchOutcome::Sent {
                email, campaign_id, ..
            } => println!("  {}  {email} (campaign {campaign_id})", "✉".green().bold()),
            DispatchOutcome::WouldSend { email, .. } => println!("  {}  {email}", "~".yellow()),
            DispatchOutcome::Failed {
                email,
                step,
                campaign_id,
                error,
                ..
            } => {
                let leftover = campaign_id
                    .as_ref()
                    .map(|id| format!(" (campaign {id} left in place)"))
                    .unwrap_or_default();
                println!(
                    "  {}  {email}: {step} failed: {error}{leftover}",
                    "✗".red().bold()
                );
            }
        }
    }

    let verb = if report.dry_run { "would send" } else { "sent" };
    let failed = report.stats.failed();
    let failed_text = format!("{failed} failed");
    println!(
        "{prefix}{} {verb}, {}",
        report.stats.sent(),
        if failed > 0 {
            failed_text.red().to_string()
        } else {
            failed_text
        }
    );
}
