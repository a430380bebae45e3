//! CLI argument definitions.

use clap::Parser;

use crate::commands::Commands;

/// Run a desu message relay, or talk to one.
#[derive(Parser, Debug)]
#[command(name = "desu")]
#[command(author, version = env!("DESU_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}
