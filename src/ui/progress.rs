//! Progress indicators with CI fallback

use super::context::UiContext;
use crate::prefetch::PrefetchEvent;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
}

impl TaskSpinner {
    /// Create a new spinner (nothing is shown until `start`)
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if self.interactive {
            println!("{} {}", style("✓").green(), message);
        } else {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if self.interactive {
            println!("{} {}", style("✗").red(), message);
        } else {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Progress bar for a prefetch run.
///
/// Shows an indicatif bar over all locked dependencies in interactive
/// mode; in CI, prints one line per fetched hash.
pub struct PrefetchProgress {
    bar: Option<ProgressBar>,
}

impl PrefetchProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() {
            let bar = ProgressBar::new(total as u64);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.blue} Prefetching  {bar:24.blue/dim} {pos}/{len} {msg:.dim}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(
                template
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                    .progress_chars("━╸─"),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    /// Record one outcome
    pub fn on_event(&self, event: &PrefetchEvent<'_>) {
        match (&self.bar, event) {
            (Some(bar), PrefetchEvent::Skipped { .. }) => bar.inc(1),
            (Some(bar), PrefetchEvent::Fetched { name, .. }) => {
                bar.set_message(name.to_string());
                bar.inc(1);
            }
            (Some(bar), PrefetchEvent::Failed { name, .. }) => {
                bar.println(format!("  {} {}", style("✗").red(), name));
                bar.inc(1);
            }
            (None, PrefetchEvent::Fetched { name, hash }) => {
                println!("  {} {} {}", style("[OK]").green(), name, style(hash).dim());
            }
            (None, _) => {}
        }
    }

    /// Finish and clear the progress bar.
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}
