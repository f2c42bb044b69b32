//! Init command - create project-local cmake2nix.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_NAME;
use crate::error::{Cmake2NixError, Cmake2NixResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# cmake2nix project configuration
# Settings here override your global config (~/.config/cmake2nix/config.toml).
# Relative paths resolve against this file's directory.

[lock]
# path = "cmake-lock.json"

[discovery]
# Discovery log, or the output of the discovery derivation
# log = "result"

[prefetch]
# jobs = 4
# timeout_secs = 300
# github_tool = "nix-prefetch-github"
# git_tool = "nix-prefetch-git"
# url_tool = "nix-prefetch-url"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> Cmake2NixResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| Cmake2NixError::io("getting current directory", e))?,
    };

    let config_path = target_dir.join(LOCAL_CONFIG_NAME);

    if config_path.exists() && !args.force {
        return Err(Cmake2NixError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| Cmake2NixError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> Cmake2NixResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).await.map_err(|e| {
            Cmake2NixError::io(format!("creating directory {}", dir.display()), e)
        })?;
    }
    Ok(())
}
