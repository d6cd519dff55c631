use std::path::PathBuf;

use clap::Parser;

use crate::application::data::LogLevel;

/// Rebuilds a directory tree from a `cd`/`ls` transcript and reports
/// directory sizes.
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    /// The transcript to replay
    #[clap(default_value = "input.txt")]
    pub transcript: PathBuf,
    #[clap(long, short, default_value = "warn", value_enum)]
    pub log_level: LogLevel,

    /// The directory holding fsreplay.yaml
    #[clap(long, short, default_value = ".")]
    pub root: PathBuf,

    /// Print the reconstructed tree before the report
    #[clap(long, short)]
    pub tree: bool,

    /// Register `dir <name>` lines from ls output as empty directories
    #[clap(long)]
    pub include_listed_directories: bool,

    /// Largest directory size counted as small
    #[clap(long)]
    pub small_limit: Option<u64>,

    /// Total size of the disk
    #[clap(long)]
    pub total_space: Option<u64>,

    /// Free space required on the disk
    #[clap(long)]
    pub required_space: Option<u64>,
}
