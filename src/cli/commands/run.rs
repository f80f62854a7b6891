use anyhow::{Context, Result};
use clap::ArgMatches;

use invariant_codes::{Config, Pipeline};

use crate::cli::run_options;
use crate::cli::utils::{format_duration, pluralize};

pub fn handle_run(matches: &ArgMatches, config: Config) -> Result<()> {
    let verbose = matches.get_flag("verbose");
    let options = run_options(matches, false);

    if verbose {
        println!("📂 Processing {}", options.dist_dir(&config).display());
    }

    let report = Pipeline::new(config)?
        .run(&options)
        .context("rewrite failed, no files were written")?;

    if verbose {
        for file in &report.changed {
            println!("  • {} ({})", file.path, pluralize("code", file.codes));
        }
    }

    println!(
        "✅ Rewrote {} of {} with {} in {}",
        pluralize("file", report.changed.len()),
        pluralize("file", report.files_scanned),
        pluralize("code", report.codes),
        format_duration(report.duration)
    );
    if let Some(manifest) = &report.manifest {
        println!("📝 Manifest written to {}", manifest.display());
    }

    Ok(())
}
