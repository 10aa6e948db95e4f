//! Govee LAN CLI - discover and control Govee lights on the local network.
//!
//! Runs discovery headless: devices found by multicast scans are kept in an
//! in-memory registry for the lifetime of the command and printed as a table
//! or JSON.

mod cli;
mod commands;
mod error;
mod host;
mod output;
mod session;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::{exit_codes, CliError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "govee_lan=debug,govee_lan_core=debug"
    } else {
        "govee_lan=info,govee_lan_core=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Discover(args) => {
            commands::run_discover(args, config_path, cli.timeout, cli.json).await
        }
        Commands::Status(args) => {
            commands::run_status(args, config_path, cli.timeout, cli.json).await
        }
        Commands::Cmd(args) => commands::run_cmd(args, config_path, cli.timeout, cli.json).await,
        Commands::Config(args) => commands::run_config(args, config_path, cli.json),
    }
}
