use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use confsync_core::config::{Overrides, load_config};
use confsync_core::pipeline;

/// Daily one-way reconciliation of a spreadsheet file inventory into a
/// Confluence page: one run reads the spreadsheet, regroups rows by
/// folder, and rewrites the page's table.
#[derive(Debug, Parser)]
#[command(name = "confsync", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH", default_value = "confsync.toml")]
    config: PathBuf,
    /// Confluence base URL, e.g. https://example.atlassian.net.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
    /// Numeric id of the page to rewrite.
    #[arg(long, value_name = "ID")]
    page_id: Option<u64>,
    /// Space key carried on updates.
    #[arg(long, value_name = "KEY")]
    space_key: Option<String>,
    /// Credentials file with API_TOKEN= and USERNAME= lines.
    #[arg(long, value_name = "PATH")]
    credentials: Option<PathBuf>,
    /// Inventory spreadsheet (.xlsx).
    #[arg(long, value_name = "PATH")]
    spreadsheet: Option<PathBuf>,
    /// Master-folder marker used to trim location paths into group keys.
    #[arg(long, value_name = "MARKER")]
    marker: Option<String>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    let settings = config.resolve_with(&Overrides {
        base_url: cli.base_url,
        page_id: cli.page_id,
        space_key: cli.space_key,
        credentials_path: cli.credentials,
        spreadsheet_path: cli.spreadsheet,
        master_folder_marker: cli.marker,
    })?;

    let report = pipeline::run(&settings)?;

    println!("\nNew table content:\n{}", report.new_body);
    if report.missing_files.is_empty() {
        println!("Every spreadsheet file was already present on the page.");
    } else {
        println!(
            "Files added to the page this run: {}",
            report.missing_files.join(", ")
        );
    }
    println!(
        "The '{}' page has been updated successfully ({} rows in {} folder groups, version {}): {}",
        report.page_title,
        report.record_count,
        report.group_count,
        report.version_number,
        report.description,
    );
    Ok(())
}
