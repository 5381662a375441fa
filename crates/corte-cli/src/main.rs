//! Corte CLI - offline rendering, segmenting, and composition of WAV files.

mod commands;
mod job;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "corte")]
#[command(author, version, about = "Offline audio rendering and segment composition", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a source file into per-segment files
    Split(commands::split::SplitArgs),

    /// Concatenate files through a render graph into one output
    Concat(commands::concat::ConcatArgs),

    /// Split, render, and reassemble a source in one pass
    Export(commands::export::ExportArgs),

    /// Compose a timeline described by a TOML job file
    Compose(commands::compose::ComposeArgs),

    /// Display WAV file information
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split(args) => commands::split::run(args),
        Commands::Concat(args) => commands::concat::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Compose(args) => commands::compose::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
