use std::process::Command;
use std::thread::sleep;

use crate::config::RunSettings;
use crate::diff;
use crate::error::{Result, SyncError};
use crate::inventory;

/// Run the configured external refresh command with the spreadsheet path
/// appended, then wait out the settle and reopen delays. Returns false when
/// no command is configured (refresh skipped).
///
/// The delays stand in for a readiness signal the external application does
/// not provide; they are tunable in config rather than hidden constants.
pub fn run_refresh_command(settings: &RunSettings) -> Result<bool> {
    let Some((program, args)) = settings.refresh_command.split_first() else {
        return Ok(false);
    };

    let status = Command::new(program)
        .args(args)
        .arg(&settings.spreadsheet_path)
        .status()
        .map_err(|error| {
            SyncError::source_data(format!("failed to run refresh command {program}: {error}"))
        })?;
    if !status.success() {
        return Err(SyncError::source_data(format!(
            "refresh command {program} exited with {status}"
        )));
    }

    println!(
        "Waiting {} seconds for the refreshed spreadsheet to settle...",
        settings.refresh_settle.as_secs()
    );
    sleep(settings.refresh_settle);
    println!(
        "Waiting {} seconds before re-opening the spreadsheet...",
        settings.reopen_delay.as_secs()
    );
    sleep(settings.reopen_delay);
    Ok(true)
}

/// Refresh the spreadsheet, re-read it from disk, and report which of its
/// file names are absent from the current page body.
///
/// This comparison reads the refreshed file, while the grouping step later
/// in the pipeline operates on the snapshot taken at startup. The diff is
/// advisory and never blocks the rewrite, so the two views are allowed to
/// disagree within one run.
pub fn refresh_and_compare(settings: &RunSettings, page_body: &str) -> Result<Vec<String>> {
    if !run_refresh_command(settings)? {
        println!("No refresh command configured; comparing against the file as-is.");
    }
    let refreshed =
        inventory::load_inventory(&settings.spreadsheet_path, &settings.master_folder_marker)?;
    Ok(diff::missing_files(
        page_body,
        refreshed.iter().map(|record| record.file_name.as_str()),
    ))
}
