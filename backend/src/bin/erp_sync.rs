//! Command-line sync runner
//!
//! Runs the same reconciliation pass as `POST /api/v1/sync/run`, against
//! Zoho Inventory or an exported CSV sheet.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kitchen_erp_backend::external::{CsvItemSource, ItemSource, ZohoInventoryClient};
use kitchen_erp_backend::services::SyncRun;
use kitchen_erp_backend::{build_state, init_tracing, Config};

#[derive(Parser, Debug)]
#[command(name = "erp-sync", version, about = "Reconcile external inventory items into materials")]
struct Cli {
    #[command(subcommand)]
    source: Source,

    /// Map and classify items without writing anything
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the full run as JSON instead of a summary
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Source {
    /// Fetch items from Zoho Inventory using the configured credentials
    Zoho,
    /// Read items from an exported CSV sheet
    Csv {
        /// Path to the sheet
        #[arg(value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },
}

fn print_summary(run: &SyncRun) {
    println!("run {} ({}) {}", run.id, run.source, run.phase.as_str());
    if run.dry_run {
        println!("dry run: nothing was written");
    }
    if let Some(failure) = &run.failure {
        println!("failed during {}: {}", failure.step, failure.message);
    }
    if let Some(report) = &run.report {
        println!(
            "external {}  with key {}  without key {}",
            report.total_from_external, report.with_key, report.without_key
        );
        println!(
            "added {}  updated {}  skipped {}  errors {}",
            report.added, report.updated, report.skipped, report.errors
        );
        for folded in &report.folded {
            println!(
                "  {} at '{}' ({}) booked to {}",
                folded.code,
                folded.location.external_name,
                folded.location.quantity,
                folded.location.folded_into
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing("erp_sync=info,kitchen_erp_backend=info,sqlx=warn");
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    let source: Box<dyn ItemSource> = match &cli.source {
        Source::Zoho => Box::new(ZohoInventoryClient::new(config.zoho.clone())?),
        Source::Csv { file } => {
            if !file.exists() {
                anyhow::bail!("CSV file not found: {}", file.display());
            }
            Box::new(CsvItemSource::new(
                file.clone(),
                config.inventory.fallback_location.clone(),
            ))
        }
    };

    let state = build_state(config).await?;
    let run = state.sync().run(source.as_ref(), cli.dry_run).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print_summary(&run);
    }

    if !run.is_completed() {
        anyhow::bail!("sync run {} failed", run.id);
    }
    Ok(())
}
