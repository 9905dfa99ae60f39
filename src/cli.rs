use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rename media files into a canonical, pattern-driven library layout.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to `config.toml` in the platform
    /// configuration directory)
    #[arg(short, long, global = true, env = "RENAMARR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage storage roots
    Roots {
        #[command(subcommand)]
        command: RootsCommand,
    },
    /// List active naming patterns
    Patterns,
    /// Show what renaming the given files would do
    Preview {
        /// Naming pattern ID
        #[arg(short, long)]
        pattern: i64,
        /// Media file IDs
        #[arg(required = true)]
        files: Vec<i64>,
    },
    /// Explain whether a file needs renaming
    Analyze {
        /// Naming pattern ID (defaults to the first active pattern)
        #[arg(short, long)]
        pattern: Option<i64>,
        /// Media file ID
        file: i64,
    },
    /// Rename files and record their new paths
    Rename {
        /// Naming pattern ID
        #[arg(short, long)]
        pattern: i64,
        /// Place files under this directory instead of their storage roots
        #[arg(long)]
        into: Option<PathBuf>,
        /// Media file IDs
        #[arg(required = true)]
        files: Vec<i64>,
    },
    /// Recompute rename flags with the first active pattern
    Refresh {
        /// Only the files of this track
        #[arg(long, conflicts_with = "file")]
        track: Option<i64>,
        /// Only this media file
        #[arg(long)]
        file: Option<i64>,
        /// Compute flags without storing them
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum RootsCommand {
    List,
    /// Register a directory as a storage root
    Add { name: String, path: PathBuf },
}
