//! Discover command - merge a discovery log into the lock file

use crate::cli::args::DiscoverArgs;
use crate::config::Config;
use crate::discovery::parse_discovery_log;
use crate::error::Cmake2NixResult;
use crate::lock::LockFile;
use crate::ui::{self, TaskSpinner, UiContext};
use std::path::Path;

/// Execute the discover command
pub async fn execute(args: DiscoverArgs, config: &Config) -> Cmake2NixResult<()> {
    let ctx = UiContext::detect();
    let log = args.log.unwrap_or_else(|| config.discovery_log_path());
    let lock_path = config.lock_path();

    ui::intro(&ctx, "cmake2nix discover");
    let lock = merge_discovery_log(&ctx, &log, &lock_path).await?;

    let pending = lock.pending().len();
    if pending == 0 {
        ui::outro_success(&ctx, &format!("{} dependencies locked", lock.len()));
    } else {
        ui::step_warn_hint(
            &ctx,
            &format!("{} of {} dependencies have placeholder hashes", pending, lock.len()),
            "Run: cmake2nix prefetch",
        );
        ui::outro_warn(&ctx, "Lock file written, hashes pending");
    }

    Ok(())
}

/// Parse the discovery log, merge it into the lock file and save
pub(crate) async fn merge_discovery_log(
    ctx: &UiContext,
    log: &Path,
    lock_path: &Path,
) -> Cmake2NixResult<LockFile> {
    let mut spinner = TaskSpinner::new(ctx);
    spinner.start(&format!("Reading {}", log.display()));
    let discovered = match parse_discovery_log(log).await {
        Ok(discovered) => discovered,
        Err(e) => {
            spinner.stop_error("Could not read discovery log");
            return Err(e);
        }
    };
    spinner.stop(&format!(
        "Found {} dependencies",
        discovered.dependencies.len()
    ));

    for skipped in &discovered.skipped {
        ui::step_warn(
            ctx,
            &format!("Skipped line {}: {}", skipped.line, skipped.reason),
        );
    }

    let existing = LockFile::load_or_default(lock_path).await?;
    let (merged, summary) = existing.merge(discovered.dependencies);
    merged.save(lock_path).await?;

    if summary.changed() {
        ui::step_ok_detail(
            ctx,
            &format!(
                "{} added, {} replaced, {} unchanged",
                summary.added.len(),
                summary.replaced.len(),
                summary.kept.len()
            ),
            &lock_path.display().to_string(),
        );
    } else {
        ui::step_info(ctx, "Lock file already up to date");
    }

    Ok(merged)
}
