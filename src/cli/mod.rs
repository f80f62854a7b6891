pub mod commands;
pub mod utils;

use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::{Path, PathBuf};

use invariant_codes::{Config, RunOptions};

/// Loads configuration from `--config` when given, otherwise from the
/// project root.
pub fn load_config(config_path: Option<&PathBuf>, root: &Path) -> Result<Config> {
    match config_path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Config::load_from_dir(root)
            .with_context(|| format!("failed to load configuration for {}", root.display())),
    }
}

pub fn project_root(matches: &ArgMatches) -> &Path {
    matches
        .get_one::<PathBuf>("root")
        .map(PathBuf::as_path)
        .unwrap_or(Path::new("."))
}

/// Builds [`RunOptions`] from the arguments shared by `run` and `check`.
pub fn run_options(matches: &ArgMatches, dry_run: bool) -> RunOptions {
    RunOptions {
        root: project_root(matches).to_path_buf(),
        dist_dir: matches.get_one::<PathBuf>("dist").cloned(),
        jobs: matches.try_get_one::<usize>("jobs").ok().flatten().copied(),
        dry_run,
    }
}
