//! cliclack theme keyed to the plain-text status tags
//!
//! Fancy and CI output use the same colour for the same outcome:
//! `[INFO]` cyan, `[OK]` green, `[WARN]` yellow, `[FAIL]` red. The cancel
//! state (an interrupted prefetch) shows as a warning.

use cliclack::ThemeState;
use console::Style;

#[derive(Debug, Clone, Default)]
pub struct Cmake2NixTheme;

/// Colour of the plain-text tag matching a prompt state
fn tag_style(state: &ThemeState) -> Style {
    match state {
        ThemeState::Active => Style::new().cyan(),
        ThemeState::Submit => Style::new().green(),
        ThemeState::Cancel => Style::new().yellow(),
        ThemeState::Error(_) => Style::new().red(),
    }
}

impl cliclack::Theme for Cmake2NixTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            // finished steps fade so the running one stands out
            ThemeState::Submit => tag_style(state).dim(),
            _ => tag_style(state),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        tag_style(state).bold()
    }
}

/// Initialize the global theme
pub fn init_theme() {
    cliclack::set_theme(Cmake2NixTheme);
}
