//! minisync — clock-guarded directory mirroring between two hosts.
//!
//! # Usage
//!
//! ```text
//! minisync init [--ip <addr>] [--user <name>] [--server-dir <path>] [--client-dir <path>]
//! minisync status [--json]
//! minisync load
//! minisync save
//! minisync diff
//! minisync update [ENCODED]
//! minisync report-time
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{init::InitArgs, status::StatusArgs, update::UpdateArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "minisync",
    version,
    about = "Mirror a local directory with one remote host, guarded by a logical clock",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the configuration file, or edit its connection fields.
    Init(InitArgs),

    /// Compare this host's clock with the remote's.
    Status(StatusArgs),

    /// Adopt the remote clock and mirror remote -> local (deletes local-only files).
    Load,

    /// Stamp a new clock and mirror local -> remote (deletes remote-only files).
    Save,

    /// List what `save` would add, delete, or modify on the remote.
    Diff,

    /// Adopt an encoded clock, or re-derive it from local modification times.
    Update(UpdateArgs),

    /// Print the stored clock as JSON (used by the remote's `load` and `status`).
    ReportTime,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Load => commands::transfer::load(),
        Commands::Save => commands::transfer::save(),
        Commands::Diff => commands::diff::run(),
        Commands::Update(args) => args.run(),
        Commands::ReportTime => commands::report_time::run(),
    }
}

/// Logs go to stderr; stdout carries `report-time` output a peer parses.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
