//! Thin `clap` dispatcher wiring `zcl` subcommands onto the core crates
//! (§6 "the CLI crate ... is intentionally thin").

pub mod args;
pub mod commands;
pub mod config;

use clap::Parser;

use args::Cli;
use config::EngineConfig;
use zcl_utils::exit_codes::ExitCode;

/// Parse `argv`, run the requested subcommand, and print its JSON result
/// to stdout. Returns the process exit code the caller's `main` should
/// use; every error is already logged before this returns.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = zcl_utils::logging::init_tracing(cli.verbose) {
        tracing::debug!(error = %e, "tracing subscriber already initialized");
    }

    let config = EngineConfig::resolve(cli.out_root.as_deref(), cli.strategies.as_deref());

    match commands::dispatch(&config, cli.command) {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(code = %e.code, message = %e.message, "command failed");
            eprintln!("{}: {}", e.code, e.message);
            e.exit_code()
        }
    }
}
