mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing::{error, Level};

/// Filter ligand libraries by rotatable bonds, TPSA, PAINS alerts and the
/// rule of five, then pick a diverse subset
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity of the program:
    /// -v for info, -vv for debug, and -vvv for trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full filtering pipeline on every target folder
    Filter(cli::filter::Args),
    /// Compute the descriptor table of a SMILES file
    Describe(cli::describe::Args),
    /// Pick a diverse subset of a SMILES file
    Pick(cli::pick::Args),
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let result = match &args.command {
        Commands::Filter(args) => cli::filter::run(args),
        Commands::Describe(args) => cli::describe::run(args),
        Commands::Pick(args) => cli::pick::run(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
