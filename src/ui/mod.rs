//! UI module for consistent CLI output
//!
//! Uses `cliclack` for log-style output with automatic fallback to plain
//! text in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use cmake2nix::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Reading discovery log...");
//! // ... do work ...
//! spinner.stop("Found 12 dependencies");
//!
//! ui::step_warn_hint(&ctx, "3 placeholder hashes", "Run: cmake2nix prefetch");
//! ```

mod context;
mod output;
mod progress;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, section, step_error_detail, step_info,
    step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::{PrefetchProgress, TaskSpinner};
pub use theme::{init_theme, Cmake2NixTheme};
