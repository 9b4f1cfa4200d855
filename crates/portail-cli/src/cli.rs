//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::commands::Command;

/// Bulletin feed client for a local portail store.
#[derive(Parser, Debug)]
#[command(name = "portail")]
#[command(author, version = env!("PORTAIL_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Store directory (defaults to the platform data directory)
    #[arg(long, env = "PORTAIL_STORE", global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which feed a command works on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedKind {
    Events,
    News,
}
