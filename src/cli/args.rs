//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// cmake2nix - Lock CMake dependencies for Nix builds
///
/// Records the dependencies a CMake project fetches at configure time,
/// pins each to a Nix fetcher and prefetches their integrity hashes.
#[derive(Parser, Debug)]
#[command(name = "cmake2nix")]
#[command(author, version, about = "Lock CMake dependencies for Nix builds", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CMAKE2NIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local cmake2nix.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Lock file path (default: from config)
    #[arg(short, long, global = true)]
    pub lock_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge a discovery log into the lock file
    Discover(DiscoverArgs),

    /// Replace placeholder hashes with verified ones
    Prefetch(PrefetchArgs),

    /// Discover, then prefetch
    Lock(LockArgs),

    /// Show locked dependencies and their hash state
    Status(StatusArgs),

    /// Create a project-local cmake2nix.toml
    Init(InitArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the discover command
#[derive(Parser, Debug, Default)]
pub struct DiscoverArgs {
    /// Discovery log file, or the discovery derivation output containing it
    #[arg(long)]
    pub log: Option<PathBuf>,
}

/// Arguments for the prefetch command
#[derive(Parser, Debug, Default, Clone)]
pub struct PrefetchArgs {
    /// Concurrent prefetch tool invocations (default: from config)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-dependency timeout in seconds (default: from config)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Exit non-zero unless every dependency ends up with a verified hash
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the lock command
#[derive(Parser, Debug, Default)]
pub struct LockArgs {
    /// Discovery log file, or the discovery derivation output containing it
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Only merge the discovery log, leave placeholder hashes in place
    #[arg(long)]
    pub no_prefetch: bool,

    #[command(flatten)]
    pub prefetch: PrefetchArgs,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing cmake2nix.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show the global config file path
    Path,

    /// Write a default global config file
    Init {
        /// Overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

/// Arguments for the completions command
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
