//! Lock command - discover, then prefetch

use super::discover::merge_discovery_log;
use super::prefetch::prefetch_lock;
use crate::cli::args::LockArgs;
use crate::config::Config;
use crate::error::Cmake2NixResult;
use crate::ui::{self, UiContext};

/// Execute the lock command
pub async fn execute(args: LockArgs, config: &Config) -> Cmake2NixResult<()> {
    let ctx = UiContext::detect();
    let log = args.log.unwrap_or_else(|| config.discovery_log_path());
    let lock_path = config.lock_path();

    ui::intro(&ctx, "cmake2nix lock");
    let mut lock = merge_discovery_log(&ctx, &log, &lock_path).await?;

    if args.no_prefetch {
        let pending = lock.pending().len();
        if pending > 0 {
            ui::step_warn_hint(
                &ctx,
                &format!("{} placeholder hashes left in place", pending),
                "Run: cmake2nix prefetch",
            );
        }
        ui::outro_success(&ctx, &format!("{} dependencies locked", lock.len()));
        return Ok(());
    }

    ui::section(&ctx, "Prefetching hashes");
    prefetch_lock(&ctx, &mut lock, &lock_path, &args.prefetch, config).await
}
