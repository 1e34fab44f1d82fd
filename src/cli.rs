//! CLI Argument Parsing
//!
//! Global flags (--json, --verbose and the directory overrides) are accepted
//! before or after the subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// berth - staged runtime-image builder and single-process launcher
#[derive(Parser, Debug)]
#[command(name = "berth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Machine-readable output (NDJSON events, JSON documents)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Stage cache and image store directory
    #[arg(long, global = true, value_name = "DIR")]
    pub store: Option<PathBuf>,

    /// Directory of base runtimes
    #[arg(long, global = true, value_name = "DIR")]
    pub bases: Option<PathBuf>,

    /// Local package index directory
    #[arg(long, global = true, value_name = "DIR")]
    pub index: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an image from a build context
    Build {
        /// Build context directory
        #[arg(default_value = ".")]
        context: PathBuf,

        /// Image tag (defaults to the context directory name)
        #[arg(short, long)]
        tag: Option<String>,

        /// Recipe file (defaults to <CONTEXT>/berth.toml)
        #[arg(short = 'f', long = "file", value_name = "RECIPE")]
        recipe: Option<PathBuf>,

        /// Rebuild every stage without consulting the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Start a tagged image and wait for its process
    Run {
        /// Image tag
        tag: String,
    },

    /// Show the metadata of a tagged image
    Inspect {
        /// Image tag
        tag: String,
    },

    /// List tagged images
    Images,

    /// Manage the stage cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List stage cache entries
    Ls,

    /// Remove entries no tagged image was built from
    Prune {
        /// Only show what would be removed
        #[arg(long)]
        dry_run: bool,
    },
}
