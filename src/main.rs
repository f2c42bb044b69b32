//! cmake2nix - Lock CMake dependencies for Nix builds
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use cmake2nix::cli::{commands, Cli, Commands};
use cmake2nix::config::ConfigManager;
use cmake2nix::error::{Cmake2NixError, Cmake2NixResult};
use console::style;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(output) = e.tool_output() {
                eprintln!("{}", style(output.trim_end()).dim());
            }
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            } else if e.is_retryable() {
                eprintln!("{} Re-running may succeed", style("Hint:").yellow());
            }
            ExitCode::FAILURE
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("cmake2nix=warn"),
        1 => EnvFilter::new("cmake2nix=info"),
        _ => EnvFilter::new("cmake2nix=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> Cmake2NixResult<()> {
    let cli = Cli::parse();
    cmake2nix::ui::init_theme();

    // Neither needs config loading
    if let Commands::Init(args) = cli.command {
        init_logging(cli.verbose, false);
        return commands::init(args).await;
    }
    if let Commands::Completions(args) = cli.command {
        return commands::completions(args);
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let cwd =
        std::env::current_dir().map_err(|e| Cmake2NixError::io("getting current directory", e))?;

    let local_config_path = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&cwd)
    };

    let mut config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, config.general.log_format == "json");
    match local_config_path {
        Some(ref path) => debug!("Using local config: {}", path.display()),
        None if cli.no_local => debug!("Local config discovery disabled (--no-local)"),
        None => debug!("No local config found"),
    }

    // Command-line paths are relative to the working directory, not the
    // project root
    if let Some(path) = cli.lock_file {
        config.lock.path = cwd.join(path);
    }

    match cli.command {
        Commands::Init(_) | Commands::Completions(_) => unreachable!("handled above"),
        Commands::Discover(args) => commands::discover(args, &config).await,
        Commands::Prefetch(args) => commands::prefetch(args, &config).await,
        Commands::Lock(args) => commands::lock(args, &config).await,
        Commands::Status(args) => commands::status(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}
