use std::path::PathBuf;

use clap::{Parser, Subcommand};
use vodwatch::types::ContentKind;

/// Announce newly added films and series from an IPTV catalog
#[derive(Parser)]
#[command(name = "vodwatch")]
#[command(about = "Checks the catalog for new films and series and announces them to Telegram channels", long_about = None)]
pub struct Cli {
    /// Config file (defaults to $VODWATCH_CONFIG, then the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the catalog and announce anything new
    Run {
        /// Only process this kind
        #[arg(short, long)]
        kind: Option<ContentKind>,
        /// Print the run reports as JSON on stdout
        #[arg(long)]
        json: bool,
    },
    /// Show what has already been announced for a kind
    State {
        kind: ContentKind,
        /// Print every identifier, not just the count
        #[arg(short, long)]
        list: bool,
    },
}
