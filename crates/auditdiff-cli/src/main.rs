//! auditdiff CLI
//!
//! Command-line interface for structural snapshot diffing

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "auditdiff")]
#[command(about = "auditdiff - Field-level change records for audit trails", long_about = None)]
struct Cli {
    /// Emit JSON logs on stderr instead of human-readable ones
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diff two JSON snapshots
    Diff(commands::diff::DiffArgs),
}

fn main() {
    let cli = Cli::parse();

    auditdiff_core::logging_facility::init(if cli.json_logs {
        auditdiff_core::logging_facility::Profile::Production
    } else {
        auditdiff_core::logging_facility::Profile::Development
    });

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
