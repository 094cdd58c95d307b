//! Terminal presentation: formatting, the spinner, and user prompts.

pub mod prompt;
pub mod render;
pub mod spinner;

pub use prompt::{Prompter, TerminalPrompter};
pub use spinner::with_spinner;

/// Width of the attached terminal, or 80 columns when there is none.
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(cols, _)| cols as usize)
        .ok()
        .filter(|cols| *cols > 0)
        .unwrap_or(80)
}
