use crate::api::ApiClient;
use crate::batch::{download_all_files, BatchReport};
use crate::config::RunConfig;
use crate::constants::{API_KEY_ENV, API_SECRET_ENV};
use crate::errors::{AppError, AppResult};
use crate::models::ApiMode;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

/// Builds the command-line definition.
///
/// - `cli`: every setting given as flags (credentials may come from the environment)
/// - `toml`: settings read from a TOML configuration file
pub fn build_command() -> Command {
    Command::new("valuation-dl")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(
            Command::new("cli")
                .about("Download valuation results for a snap date")
                .after_help("Example:\n  valuation-dl cli -d 2024-07-31 -c ACME -s 'London 4 PM' -a Swaptions")
                .arg(
                    Arg::new("date")
                        .short('d')
                        .long("date")
                        .help("Snap date (YYYY-MM-DD)")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("client")
                        .short('c')
                        .long("client")
                        .help("Client identifier")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .help("API environment: 'prod' or 'metadata' (unknown values use prod)")
                        .default_value("prod")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("snap_time")
                        .short('s')
                        .long("snap-time")
                        .help("Snap time label, repeatable (default: 'London 4 PM' and 'New York 4 PM')")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("asset_type")
                        .short('a')
                        .long("asset-type")
                        .help("Sub-asset to download, repeatable (default: Swaptions, Caps & Floors, Forwards, Options)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .help("Directory for the downloaded CSV files")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("api_key")
                        .long("api-key")
                        .help("API key")
                        .env(API_KEY_ENV)
                        .hide_env_values(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("api_secret")
                        .long("api-secret")
                        .help("API secret")
                        .env(API_SECRET_ENV)
                        .hide_env_values(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run using a TOML configuration file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Turns the `cli` subcommand's flags into a run configuration.
pub fn config_from_cli_args(sub: &ArgMatches) -> RunConfig {
    let mut config = RunConfig::default();

    if let Some(date) = sub.get_one::<String>("date") {
        config.snap_date = date.clone();
    }
    if let Some(client) = sub.get_one::<String>("client") {
        config.client = client.clone();
    }
    if let Some(mode) = sub.get_one::<String>("mode") {
        config.mode = ApiMode::from(mode.as_str());
    }
    if let Some(times) = sub.get_many::<String>("snap_time") {
        config.snap_times = times.cloned().collect();
    }
    if let Some(types) = sub.get_many::<String>("asset_type") {
        config.asset_types = types.cloned().collect();
    }
    if let Some(dir) = sub.get_one::<PathBuf>("output_dir") {
        config.output_dir = dir.clone();
    }
    if let Some(key) = sub.get_one::<String>("api_key") {
        config.api_key = key.clone();
    }
    if let Some(secret) = sub.get_one::<String>("api_secret") {
        config.api_secret = secret.clone();
    }

    config
}

/// Parses the process arguments and runs the selected subcommand.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or fails validation
/// (including empty credentials). Per-asset and per-snapshot-time failures are
/// logged and do not surface here.
pub async fn cli() -> AppResult<()> {
    let cmd = build_command();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    match matches.subcommand() {
        Some(("cli", sub)) => {
            run_workflow(config_from_cli_args(sub)).await?;
        }
        Some(("toml", sub)) => {
            let config_path = sub
                .get_one::<PathBuf>("config")
                .expect("config is required");
            let config = RunConfig::from_toml_file(config_path)?.with_env_credentials();
            run_workflow(config).await?;
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        }
    }

    Ok(())
}

async fn run_workflow(config: RunConfig) -> AppResult<BatchReport> {
    config.validate()?;

    info!(
        mode = config.mode.display_name(),
        snap_date = %config.snap_date,
        snap_times = config.snap_times.len(),
        client = %config.client,
        output_dir = %config.output_dir.display(),
        "Starting valuation results download"
    );

    let api = ApiClient::new(&config.mode.base_url(), config.credentials())?;
    let report = download_all_files(&api, &config).await;

    info!(
        downloaded = report.downloaded.len(),
        no_valuation_results = report.no_valuation_results,
        no_link = report.no_link,
        failed = report.failed_assets,
        filtered_out = report.filtered_out,
        failed_snap_times = report.failed_snap_times.len(),
        "All snap times processed"
    );

    Ok(report)
}
