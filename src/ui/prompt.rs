//! User input behind a small trait so the menu can be driven by a script in tests.

use crate::error::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};

pub trait Prompter {
    /// Reads one free-form line. Empty input is allowed.
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Asks a yes/no question. Anything but an explicit yes counts as no.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;

    /// Waits for Enter.
    fn pause(&mut self, prompt: &str) -> Result<()> {
        self.read_line(prompt).map(|_| ())
    }
}

/// Interactive prompts on the controlling terminal via `dialoguer`.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        let line = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(line)
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(answer)
    }
}
