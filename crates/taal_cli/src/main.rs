//! taal CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Missing credentials or configuration, or a bad variable name
//! - 5: Terraform error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taal_iac::IacError;

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const PRECONDITION: u8 = 2;
    pub const TERRAFORM_ERROR: u8 = 5;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet);

    let result = match cli.command {
        Commands::Apply(args) => commands::apply::execute(&cli.global, args).await,
        Commands::Destroy(args) => commands::destroy::execute(&cli.global, args).await,
        Commands::Output(args) => commands::output::execute(&cli.global, args).await,
        Commands::Version => commands::version::execute(&cli.global).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if let Some(diagnostics) = e.downcast_ref::<IacError>().and_then(IacError::diagnostics) {
                eprintln!("{}", diagnostics.trim_end());
            }
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    // `taal` also matches the taal_iac and taal_runner targets.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,taal={}", level)));

    // A second initialization only happens in tests; ignore it.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<IacError>() {
        Some(err) if err.is_precondition() => ExitCodes::PRECONDITION,
        Some(IacError::CommandFailed(_)) | Some(IacError::Runner(_)) => ExitCodes::TERRAFORM_ERROR,
        _ => ExitCodes::GENERAL_ERROR,
    }
}
