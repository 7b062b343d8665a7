//! lot-manager CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Not found
//! - 3: Conflict
//! - 4: Invalid input or state
//! - 5: File I/O failure

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{Cli, Commands};
use lot_manager::{ErrorKind, Lot, LotError};

pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const NOT_FOUND: u8 = 2;
    pub const CONFLICT: u8 = 3;
    pub const INVALID: u8 = 4;
    pub const IO_FAILURE: u8 = 5;
}

fn main() -> ExitCode {
    // Logs go to stderr so --json output stays clean
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lot_manager=info,warn")))
        .try_init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.lot_config()?;
    let mut lot = commands::open_lot(config)?;
    if cli.command.changes_state() {
        commands::require_admin(&lot, &cli.auth)?;
    }

    match cli.command {
        Commands::Status(args) => commands::status(&lot, args),
        Commands::Report(args) => commands::report(&lot, args),
        Commands::Admin(command) => commands::admin(&mut lot, command),
        Commands::Vehicle(command) => commands::vehicle(&mut lot, command),
        Commands::Park { vehicle_id } => commands::park(&mut lot, &vehicle_id),
        Commands::Unpark { vehicle_id } => commands::unpark(&mut lot, &vehicle_id),
        Commands::Owners(args) => commands::owners(&lot, args),
        Commands::Ui => run_ui_mode(lot),
    }
}

/// Map the underlying lot error, if any, to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    let kind = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<LotError>())
        .map(LotError::kind);

    match kind {
        Some(ErrorKind::NotFound) => ExitCodes::NOT_FOUND,
        Some(ErrorKind::Conflict) => ExitCodes::CONFLICT,
        Some(ErrorKind::Invalid | ErrorKind::InvalidState | ErrorKind::ClockSkew) => {
            ExitCodes::INVALID
        }
        Some(ErrorKind::IoFailure) => ExitCodes::IO_FAILURE,
        None => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(lot: Lot) -> Result<()> {
    println!("🖥️  Loading lot dashboard... (Press 'q' to quit)\n");

    let mut app = ui::App::new(lot);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_lot: Lot) -> Result<()> {
    anyhow::bail!("TUI mode not available, rebuild with: cargo build --features tui")
}
