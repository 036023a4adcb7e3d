//! qutil command-line interface
//!
//! Builds QFT, phase-estimation and QFT-arithmetic circuits, prints them as
//! OpenQASM 3, JSON, a text drawing or a summary, and simulates them.
//!
//! ```text
//! qutil qft -n 4 --inverse
//! qutil add -n 3 -f stats
//! qutil run --shots 500 qpe -n 5 --phase 0.3
//! qutil build --config circuits.yaml -o out/
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::circuit::CircuitCommand;
use commands::run::RunArgs;
use commands::{build, run, version};
use config::{OutputFormat, Settings};

/// qutil - QFT, phase estimation and QFT arithmetic circuits
#[derive(Parser)]
#[command(name = "qutil")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv); QUTIL_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format [default: qasm, or QUTIL_OUTPUT_FORMAT]
    #[arg(short, long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Output file (build: output directory)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Circuit(CircuitCommand),

    /// Build every circuit listed in a YAML or JSON file
    Build {
        /// Build file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Simulate a circuit and print measurement counts
    Run(RunArgs),

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("QUTIL_LOG").unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format_only = Settings {
        output_format: cli.format,
        ..Settings::default()
    };

    // Execute command
    let result = match &cli.command {
        Commands::Circuit(command) => {
            build::execute_single(command, format_only, cli.output.as_deref())
        }
        Commands::Build { config } => {
            build::execute_file(config, format_only, cli.output.as_deref())
        }
        Commands::Run(args) => run::execute(args, cli.format),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
