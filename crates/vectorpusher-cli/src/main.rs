//! vectorpusher CLI
//!
//! Command line front end for sculpting token embedding vectors.
//!
//! # Commands
//!
//! - `schedule`: Print the parameters derived from a strength
//! - `sculpt`: Sculpt rows of a JSON embedding table
//!
//! Results are written to stdout as JSON, logs to stderr.
//! Exit code 0 on success, 1 on error.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// vectorpusher - Neighbor-Consensus Embedding Sculpting
#[derive(Parser)]
#[command(name = "vectorpusher")]
#[command(version)]
#[command(about = "Sculpt token embedding vectors toward their neighborhood consensus")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schedule derived from a strength
    ///
    /// Shows the neighbor count, temperature, step scale and angular cap,
    /// plus the multi-scale variants built from them.
    Schedule(commands::schedule::ScheduleArgs),
    /// Sculpt rows of a JSON embedding table
    ///
    /// The table file holds an array of equally sized rows. Each listed
    /// token id is sculpted against the whole table:
    ///   vectorpusher sculpt --table vocab.json --tokens 3,17,42 --strength 0.6
    Sculpt(commands::sculpt::SculptArgs),
}

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Schedule(args) => commands::schedule::handle_schedule(args),
        Commands::Sculpt(args) => commands::sculpt::handle_sculpt(args),
    };

    std::process::exit(exit_code);
}
