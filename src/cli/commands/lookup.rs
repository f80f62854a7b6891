use anyhow::{Context, Result};
use clap::ArgMatches;
use std::path::PathBuf;

use invariant_codes::{Config, ManifestIndex};

pub fn handle_lookup(matches: &ArgMatches, config: &Config) -> Result<()> {
    let code = *matches
        .get_one::<u32>("code")
        .context("missing error code")?;
    let path = matches
        .get_one::<PathBuf>("manifest")
        .cloned()
        .unwrap_or_else(|| config.output.dist_dir.join(&config.output.manifest));

    let index = ManifestIndex::load(&path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    let info = index.get(code)?;

    if let (Some(key), Some(version)) = (&index.version_key, &index.version) {
        println!("{}: {}", key, version);
    }
    println!("Code:    {}", info.code);
    match info.line {
        Some(line) => println!("File:    {}:{}", info.file, line),
        None => println!("File:    {}", info.file),
    }
    println!("Message: {}", info.node);
    if !info.args.is_empty() {
        println!("Args:    {}", info.args.join(", "));
    }
    Ok(())
}
