use anyhow::Result;
use clap::ArgMatches;

use invariant_codes::{Config, Pipeline};

use crate::cli::run_options;
use crate::cli::utils::{format_duration, pluralize};

/// Returns `true` when no file would change.
pub fn handle_check(matches: &ArgMatches, config: Config) -> Result<bool> {
    let verbose = matches.get_flag("verbose");
    let report = Pipeline::new(config)?.run(&run_options(matches, true))?;

    if verbose {
        println!(
            "🔍 Checked {} ({} parsed) in {}",
            pluralize("file", report.files_scanned),
            report.files_parsed,
            format_duration(report.duration)
        );
    }

    if !report.has_changes() {
        println!("✅ All files already processed");
        return Ok(true);
    }

    println!(
        "❌ {} would change, {} would be allocated:",
        pluralize("file", report.changed.len()),
        pluralize("code", report.codes)
    );
    for file in &report.changed {
        println!("  • {} ({})", file.path, pluralize("site", file.codes));
    }
    Ok(false)
}
