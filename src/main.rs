use clap::{Arg, ArgAction, Command};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::process;

use invariant_codes::config::LoggingConfig;

mod cli;

fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    let matches = build_cli().get_matches();

    if let Err(e) = run_command(matches) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("invariant-codes")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Replace invariant and diagnostic messages with numeric codes")
        .long_about(
            "Rewrites invariant assertions, invariant.warn/error calls and InvariantError \
             constructions in built JavaScript so production builds carry numeric codes, \
             and writes a manifest mapping each code back to its message",
        )
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file (default: ./invariant-codes.toml if present)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log level filter, overrides the configured level")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .global(true),
        )
        .subcommand(
            Command::new("run")
                .about("Rewrite the dist directory and emit the error code manifest")
                .args(project_args())
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help("Number of parallel parse workers")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Report files that still contain unprocessed sites")
                .long_about("Dry run that exits with status 1 when any file would change")
                .args(project_args()),
        )
        .subcommand(
            Command::new("lookup")
                .about("Show the message behind a production error code")
                .arg(
                    Arg::new("code")
                        .help("Error code")
                        .required(true)
                        .index(1)
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    Arg::new("manifest")
                        .short('m')
                        .long("manifest")
                        .help("Manifest file (default: <dist>/<manifest> from the configuration)")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

fn project_args() -> [Arg; 3] {
    [
        Arg::new("root")
            .long("root")
            .help("Project root containing package.json")
            .value_parser(clap::value_parser!(PathBuf))
            .default_value("."),
        Arg::new("dist")
            .long("dist")
            .help("Build output directory, relative to the root")
            .value_parser(clap::value_parser!(PathBuf)),
        Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Verbose output")
            .action(ArgAction::SetTrue),
    ]
}

fn run_command(matches: clap::ArgMatches) -> anyhow::Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    let log_level = matches.get_one::<String>("log-level");

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            let config = cli::load_config(config_path, cli::project_root(sub_matches))?;
            init_tracing(&config.logging, log_level);
            cli::commands::run::handle_run(sub_matches, config)
        }
        Some(("check", sub_matches)) => {
            let config = cli::load_config(config_path, cli::project_root(sub_matches))?;
            init_tracing(&config.logging, log_level);
            let clean = cli::commands::check::handle_check(sub_matches, config)?;
            if !clean {
                process::exit(1);
            }
            Ok(())
        }
        Some(("lookup", sub_matches)) => {
            let config = cli::load_config(config_path, Path::new("."))?;
            init_tracing(&config.logging, log_level);
            cli::commands::lookup::handle_lookup(sub_matches, &config)
        }
        _ => unreachable!("subcommand is required"),
    }
}

/// `RUST_LOG` wins over `--log-level`, which wins over the configured level.
fn init_tracing(logging: &LoggingConfig, level: Option<&String>) {
    use tracing_subscriber::EnvFilter;

    let default_level = level.map(String::as_str).unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("invariant_codes={default_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match logging.format.as_str() {
        "json" => builder.json().try_init(),
        "compact" => builder.compact().try_init(),
        _ => builder.pretty().try_init(),
    };
    if let Err(e) = result {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }
}
