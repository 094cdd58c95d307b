//! A one-line spinner shown while a blocking installer command runs.
//!
//! The animation is repainted by indicatif's steady-tick thread. [`Spinner`] is a guard:
//! dropping it (or calling [`Spinner::stop`]) stops that thread and erases the line, so
//! the terminal is clean on every exit path of the wrapped operation.

use crate::error::Result;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::future::Future;
use std::time::Duration;

/// Braille frames; the trailing empty string is indicatif's "finished" frame.
const FRAMES: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""];
const TICK: Duration = Duration::from_millis(100);

pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Starts animating `label` on stderr. Nothing is drawn when stderr is not a terminal.
    pub fn start(label: impl Into<String>) -> Result<Self> {
        Self::start_on(label, ProgressDrawTarget::stderr())
    }

    pub fn start_on(label: impl Into<String>, target: ProgressDrawTarget) -> Result<Self> {
        let style = ProgressStyle::with_template("{spinner:.yellow} {msg:.yellow}")?
            .tick_strings(&FRAMES);
        let bar = ProgressBar::with_draw_target(None, target)
            .with_style(style)
            .with_message(label.into());
        bar.enable_steady_tick(TICK);
        Ok(Self { bar })
    }

    /// Stops the animation and clears its line.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        // Join the tick thread before erasing so no frame lands after the clear.
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

/// Runs `operation` with a spinner labelled `label` on screen.
///
/// Nothing else may write to the terminal until this returns.
pub async fn with_spinner<F, T>(label: &str, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let spinner = Spinner::start(label)?;
    let result = operation.await;
    spinner.stop();
    result
}
