//! Prefetch command - replace placeholder hashes with verified ones

use crate::cli::args::PrefetchArgs;
use crate::config::Config;
use crate::error::{Cmake2NixError, Cmake2NixResult};
use crate::lock::LockFile;
use crate::prefetch::{prefetch_all_with, NixPrefetcher, PrefetchOptions, PrefetchReport};
use crate::ui::{self, PrefetchProgress, UiContext};
use futures_util::{Stream, StreamExt};
use std::path::Path;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Exit status after a second Ctrl-C, as a shell reports SIGINT
const EXIT_INTERRUPTED: i32 = 130;

/// Execute the prefetch command
pub async fn execute(args: PrefetchArgs, config: &Config) -> Cmake2NixResult<()> {
    let ctx = UiContext::detect();
    let lock_path = config.lock_path();
    let mut lock = LockFile::load(&lock_path).await?;

    ui::intro(&ctx, "cmake2nix prefetch");
    prefetch_lock(&ctx, &mut lock, &lock_path, &args, config).await
}

/// Prefetch every pending hash in `lock`, then save it.
///
/// The lock file is saved even when some fetches fail or the run is
/// interrupted, so progress is never lost. The first Ctrl-C stops new
/// fetches; a second one, at any point until this returns, exits at once
/// and may leave the lock file at its previous contents.
pub(crate) async fn prefetch_lock(
    ctx: &UiContext,
    lock: &mut LockFile,
    lock_path: &Path,
    args: &PrefetchArgs,
    config: &Config,
) -> Cmake2NixResult<()> {
    let mut settings = config.prefetch.clone();
    if let Some(timeout) = args.timeout {
        settings.timeout_secs = timeout;
    }
    let provider = NixPrefetcher::from_config(&settings);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let _interrupt = AbortOnDrop(tokio::spawn(async move {
        let ctrl_c = futures_util::stream::unfold((), |()| async {
            Some((tokio::signal::ctrl_c().await, ()))
        });
        if second_interrupt(Box::pin(ctrl_c), cancel_tx).await {
            warn!("Interrupted again, exiting without finishing");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }));

    let options = PrefetchOptions {
        jobs: args.jobs.unwrap_or(settings.jobs),
        cancel: Some(cancel_rx),
    };

    let progress = PrefetchProgress::new(ctx, lock.len());
    let report = prefetch_all_with(lock, &provider, &options, |event| {
        progress.on_event(&event)
    })
    .await;
    progress.finish();

    lock.save(lock_path).await?;
    print_report(ctx, &report);

    if args.strict && !report.is_complete() {
        return Err(Cmake2NixError::PrefetchIncomplete {
            verified: report.verified(),
            total: report.total,
        });
    }

    Ok(())
}

/// Resolves `true` on the second interrupt. The first only flips `cancel`.
/// A listener that fails or ends resolves `false`.
async fn second_interrupt<S>(mut interrupts: S, cancel: watch::Sender<bool>) -> bool
where
    S: Stream<Item = std::io::Result<()>> + Unpin,
{
    match interrupts.next().await {
        Some(Ok(())) => {}
        Some(Err(e)) => {
            debug!("Cannot listen for Ctrl-C: {}", e);
            return false;
        }
        None => return false,
    }

    debug!("Interrupt received");
    let _ = cancel.send(true);
    matches!(interrupts.next().await, Some(Ok(())))
}

/// Stops the interrupt listener on every return path
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn print_report(ctx: &UiContext, report: &PrefetchReport) {
    if report.total == 0 {
        ui::step_info(ctx, "No dependencies in lock file");
        return;
    }

    for failure in &report.failures {
        ui::step_error_detail(
            ctx,
            &failure.name,
            &failure.reason,
            failure.output.as_deref(),
        );
    }

    if report.cancelled {
        ui::step_warn(
            ctx,
            &format!(
                "Interrupted, {} dependencies not attempted",
                report.not_attempted()
            ),
        );
    }

    ui::step_info(
        ctx,
        &format!(
            "{} fetched, {} already verified, {} failed",
            report.succeeded,
            report.skipped,
            report.failures.len()
        ),
    );

    let tally = format!(
        "{}/{} hashes verified ({:.0}%)",
        report.verified(),
        report.total,
        report.completion_ratio() * 100.0
    );
    if report.is_complete() {
        ui::outro_success(ctx, &tally);
    } else {
        ui::remark(ctx, "Re-run: cmake2nix prefetch");
        ui::outro_warn(ctx, &tally);
    }
}
