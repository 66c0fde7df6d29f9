//! `dolisync import`: reconcile a JSON file of contacts into Dolibarr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use dolisync_client::DolibarrClient;
use dolisync_sync::{load_records, run_import, ImportReport, RecordOutcome};

use super::connection_config;

/// Arguments for `dolisync import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of contact records.
    pub file: PathBuf,

    /// Look contacts up but create and update nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ImportArgs {
    pub fn run(self, config_path: Option<&Path>) -> Result<()> {
        let config = connection_config(config_path)?;
        let records = load_records(&self.file)
            .with_context(|| format!("failed to read contacts from {}", self.file.display()))?;

        let client = DolibarrClient::new(&config.api);
        tracing::debug!(base_url = client.base_url(), records = records.len(), "starting import");
        let report = run_import(&client, &records, self.dry_run);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize import report")?
            );
            return Ok(());
        }

        print_outcomes(&report);
        print_summary(&report);
        Ok(())
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "result")]
    label: &'static str,
    #[tabled(rename = "contacts")]
    count: u64,
}

fn print_outcomes(report: &ImportReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    println!("{prefix}Processed {} record(s)", report.outcomes.len());

    for outcome in &report.outcomes {
        match outcome {
            RecordOutcome::Created { email, id } => {
                println!("  {}  {email} (id {id})", "+".green().bold())
            }
            RecordOutcome::WouldCreate { email } => println!("  {}  {email}", "+".green()),
            RecordOutcome::Updated { email, id, diff } => {
                println!("  {}  {email} (id {id}): {diff}", "✎".yellow().bold())
            }
            RecordOutcome::WouldUpdate { email, id, diff } => {
                println!("  {}  {email} (id {id}): {diff}", "~".yellow())
            }
            RecordOutcome::Unchanged { email, .. } => {
                println!("  {}  {email}", "·".bright_black())
            }
            RecordOutcome::Invalid { reason } => {
                println!("  {}  skipped record: {reason}", "!".red().bold())
            }
            RecordOutcome::Failed {
                email,
                stage,
                error,
            } => println!("  {}  {email}: {stage} failed: {error}", "✗".red().bold()),
        }
    }
}

fn print_summary(report: &ImportReport) {
    let stats = &report.stats;
    let rows = vec![
        SummaryRow {
            label: "created",
            count: stats.created(),
        },
        SummaryRow {
            label: "updated",
            count: stats.updated(),
        },
        SummaryRow {
            label: "unchanged",
            count: stats.existing(),
        },
        SummaryRow {
            label: "errors",
            count: stats.error(),
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if stats.error() > 0 {
        println!(
            "{}",
            format!("{} record(s) failed; see messages above.", stats.error()).red()
        );
    }
}
