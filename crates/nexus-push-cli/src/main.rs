//! # nexus-push CLI entry point
//!
//! Parses command-line arguments, sets up logging and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use nexus_push_cli::check::{run_check, CheckArgs};
use nexus_push_cli::cleanup::{run_cleanup, CleanupArgs};
use nexus_push_cli::params::{run_params, ParamsArgs};
use nexus_push_cli::report::{run_report, ReportArgs};
use nexus_push_cli::servers::{run_servers, ServersArgs};
use nexus_push_cli::upload::{run_upload, UploadArgs};
use nexus_push_core::constants::SERVER_SETTINGS_FILE;

/// Push build artifacts to Nexus and clean them up with the build.
#[derive(Parser, Debug)]
#[command(name = "nexus-push", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Server registry settings file.
    #[arg(long, global = true, env = "NEXUS_PUSH_REGISTRY", default_value = SERVER_SETTINGS_FILE)]
    registry: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload the artifacts of a finished build.
    Upload(UploadArgs),

    /// Delete the Nexus components of purged builds.
    Cleanup(CleanupArgs),

    /// Show recorded artifacts of a build with their current components.
    Report(ReportArgs),

    /// Parse an upload specification.
    Check(CheckArgs),

    /// Manage registered Nexus servers.
    Servers(ServersArgs),

    /// Print shared server parameters for a build job.
    Params(ParamsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    tracing::debug!(registry = %cli.registry.display(), "nexus-push starting");

    let result = match &cli.command {
        Commands::Upload(args) => run_upload(args, &cli.registry),
        Commands::Cleanup(args) => run_cleanup(args, &cli.registry),
        Commands::Report(args) => run_report(args, &cli.registry),
        Commands::Check(args) => run_check(args),
        Commands::Servers(args) => run_servers(args, &cli.registry),
        Commands::Params(args) => run_params(args, &cli.registry),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
