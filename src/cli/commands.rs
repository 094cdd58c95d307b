use super::{MenuState, MENU_OPTIONS};
use crate::error::{AppError, Result};
use crate::installer::Installer;
use crate::models::{canonical_name, BatchOutcome, PackageRecord};
use crate::ui::render::{self, Status, REMOVAL_SUMMARY, UPDATE_SUMMARY};
use crate::ui::{self, with_spinner, Prompter};
use chrono::Local;
use colored::Colorize;
use std::io::Write;
use tracing::{debug, error, info, warn};

/// Packages picked for removal, plus whatever could not be matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub names: Vec<String>,
    pub invalid: Vec<String>,
}

/// Resolves comma-separated 1-based numbers and/or package names against `packages`.
///
/// Names match case-insensitively with `-`/`_`/`.` treated alike. Repeats are collapsed,
/// order of first mention is kept.
pub fn resolve_selection(input: &str, packages: &[PackageRecord]) -> Selection {
    let mut selection = Selection::default();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let found = match token.parse::<usize>() {
            Ok(n) if (1..=packages.len()).contains(&n) => Some(&packages[n - 1]),
            Ok(_) => None,
            Err(_) => {
                let wanted = canonical_name(token);
                packages.iter().find(|p| p.canonical_name() == wanted)
            },
        };
        match found {
            Some(pkg) if !selection.names.contains(&pkg.name) => selection.names.push(pkg.name.clone()),
            Some(_) => {},
            None => selection.invalid.push(token.to_string()),
        }
    }
    selection
}

/// The text shown for a failed package in a batch summary.
fn failure_detail(err: &AppError) -> String {
    match err {
        AppError::ProcessFailed { stderr, .. } if !stderr.is_empty() => stderr.clone(),
        other => other.to_string(),
    }
}

/// Runs the interactive menu against an installer.
///
/// All terminal text goes through `out`; prompts go through the [`Prompter`]. Failures
/// inside an action are reported as a status line and the loop returns to the menu.
/// The terminal width is read again for every render.
pub struct MenuController<I, P, W> {
    installer: I,
    prompter: P,
    out: W,
    state: MenuState,
    fixed_width: Option<usize>,
}

impl<I, P, W> MenuController<I, P, W>
where
    I: Installer,
    P: Prompter,
    W: Write,
{
    pub fn new(installer: I, prompter: P, out: W) -> Self {
        Self {
            installer,
            prompter,
            out,
            state: MenuState::Menu,
            fixed_width: None,
        }
    }

    #[cfg(test)]
    fn with_width(mut self, width: usize) -> Self {
        self.fixed_width = Some(width);
        self
    }

    fn width(&self) -> usize {
        self.fixed_width.unwrap_or_else(ui::terminal_width)
    }

    /// Loops until the exit option is chosen.
    pub async fn run(&mut self) -> Result<()> {
        while self.state != MenuState::Exit {
            self.step().await?;
        }

        let goodbye = "Thank you for using Python Package Manager. Goodbye!";
        writeln!(self.out, "\n{}", goodbye.green())?;
        Ok(())
    }

    /// Advances the state machine by one transition.
    pub async fn step(&mut self) -> Result<()> {
        match self.state {
            MenuState::Menu => self.select()?,
            MenuState::Exit => {},
            action => {
                info!("Running menu action {:?}", action);
                if let Err(e) = self.perform(action).await {
                    error!("Menu action {:?} failed: {:?}", action, e);
                    self.status(Status::Error, &e.to_string())?;
                }
                if let Err(e) = self.prompter.pause("Press Enter to continue...") {
                    debug!("Pause prompt failed: {}", e);
                }
                self.state = MenuState::Menu;
            },
        }
        Ok(())
    }

    fn select(&mut self) -> Result<()> {
        let width = self.width();
        let screen = format!("{}\n{}", render::banner(width), render::menu(&MENU_OPTIONS, width));
        self.write(&screen)?;

        let prompt = format!("Enter your choice (1-{})", MENU_OPTIONS.len());
        let choice = match self.prompter.read_line(&prompt) {
            Ok(choice) => choice,
            Err(e) => {
                // Input is gone (EOF, closed terminal); nothing more can be asked.
                warn!("Could not read menu choice ({}), exiting", e);
                self.state = MenuState::Exit;
                return Ok(());
            },
        };

        match MenuState::from_choice(&choice) {
            Some(next) => {
                debug!("Menu choice {:?} -> {:?}", choice.trim(), next);
                self.state = next;
            },
            None => {
                let message = format!(
                    "Invalid selection: {}. Please enter a number between 1 and {}",
                    choice.trim(),
                    MENU_OPTIONS.len()
                );
                self.status(Status::Error, &message)?;
            },
        }
        Ok(())
    }

    async fn perform(&mut self, action: MenuState) -> Result<()> {
        match action {
            MenuState::Listing => self.list_packages().await,
            MenuState::CheckingOutdated => self.check_outdated().await.map(|_| ()),
            MenuState::Updating => self.update_all().await,
            MenuState::Removing => self.remove_packages().await,
            MenuState::Menu | MenuState::Exit => Ok(()),
        }
    }

    async fn fetch_installed(&mut self) -> Result<Vec<PackageRecord>> {
        let listing = with_spinner("Getting installed packages", self.installer.list_installed()).await?;
        for skipped in &listing.skipped {
            self.status(Status::Warning, &format!("Skipped unreadable installer output {}", skipped))?;
        }
        Ok(listing.packages)
    }

    async fn list_packages(&mut self) -> Result<()> {
        let packages = self.fetch_installed().await?;
        if packages.is_empty() {
            return self.status(Status::Warning, "No packages are installed!");
        }
        self.status(Status::Info, &format!("Found {} installed package(s)", packages.len()))?;
        let table = render::package_table("INSTALLED PACKAGES", &packages, self.width());
        self.write(&table)
    }

    /// Shows outdated packages and hands them back for updating.
    async fn check_outdated(&mut self) -> Result<Vec<PackageRecord>> {
        let listing = with_spinner("Checking for outdated packages", self.installer.list_outdated()).await?;
        for skipped in &listing.skipped {
            self.status(Status::Warning, &format!("Skipped unreadable installer output {}", skipped))?;
        }
        if listing.is_empty() {
            self.status(Status::Success, "All packages are up to date!")?;
            return Ok(Vec::new());
        }

        self.status(
            Status::Info,
            &format!("Found {} outdated package(s)", listing.packages.len()),
        )?;
        let table = render::outdated_table(&listing.packages, self.width());
        self.write(&table)?;
        Ok(listing.packages)
    }

    async fn update_all(&mut self) -> Result<()> {
        let outdated = self.check_outdated().await?;
        if outdated.is_empty() {
            return Ok(());
        }

        let prompt = format!("Update {} package(s) now?", outdated.len());
        if !self.prompter.confirm(&prompt)? {
            return self.status(Status::Warning, "Update cancelled, nothing was changed");
        }

        let section = render::section("UPDATING PACKAGES", self.width());
        self.write(&section)?;

        let mut outcome = BatchOutcome::default();
        for pkg in &outdated {
            let latest = pkg.latest_version.as_deref().unwrap_or("latest");
            self.status(
                Status::Processing,
                &format!(
                    "Package: {} (Current: {}, Latest: {})",
                    pkg.name, pkg.installed_version, latest
                ),
            )?;

            let label = format!("Updating {}", pkg.name);
            match with_spinner(&label, self.installer.upgrade(&pkg.name)).await {
                Ok(summary) => {
                    info!("Updated {}: {}", pkg.name, summary);
                    outcome.succeeded.push(format!(
                        "{} ({} → {})",
                        pkg.name, pkg.installed_version, latest
                    ));
                    self.status(Status::Success, &format!("Updated {} to {}", pkg.name, latest))?;
                },
                Err(e) => {
                    error!("Failed to update {}: {}", pkg.name, e);
                    outcome.failed.push(render::failure_entry(&pkg.name, &failure_detail(&e)));
                    self.status(Status::Error, &format!("Failed to update {}", pkg.name))?;
                },
            }
        }

        let summary = render::batch_summary(UPDATE_SUMMARY, &outcome, self.width());
        self.write(&summary)
    }

    async fn remove_packages(&mut self) -> Result<()> {
        let packages = self.fetch_installed().await?;
        if packages.is_empty() {
            return self.status(Status::Warning, "No packages are installed!");
        }
        let table = render::package_table("INSTALLED PACKAGES", &packages, self.width());
        self.write(&table)?;

        let names = loop {
            let input = self.prompter.read_line(
                "Enter package number(s) or name(s) to remove (comma-separated) or 'q' to return",
            )?;
            if input.trim().eq_ignore_ascii_case("q") {
                return Ok(());
            }

            let selection = resolve_selection(&input, &packages);
            for token in &selection.invalid {
                self.status(Status::Error, &format!("Invalid package selection: {}", token))?;
            }
            if selection.names.is_empty() {
                self.status(Status::Error, "No valid packages selected")?;
                continue;
            }
            break selection.names;
        };

        let prompt = format!("Remove {} package(s): {}?", names.len(), names.join(", "));
        if !self.prompter.confirm(&prompt)? {
            return self.status(Status::Warning, "Removal cancelled, nothing was uninstalled");
        }

        let section = render::section("REMOVING PACKAGES", self.width());
        self.write(&section)?;

        let mut outcome = BatchOutcome::default();
        for name in &names {
            self.status(Status::Processing, &format!("Removing package: {}", name))?;
            let label = format!("Removing {}", name);
            match with_spinner(&label, self.installer.uninstall(name)).await {
                Ok(()) => {
                    info!("Removed {}", name);
                    outcome.succeeded.push(name.clone());
                    self.status(Status::Success, &format!("Successfully removed {}", name))?;
                },
                Err(e) => {
                    error!("Failed to remove {}: {}", name, e);
                    outcome.failed.push(render::failure_entry(name, &failure_detail(&e)));
                    self.status(Status::Error, &format!("Failed to remove {}", name))?;
                },
            }
        }

        let summary = render::batch_summary(REMOVAL_SUMMARY, &outcome, self.width());
        self.write(&summary)
    }

    fn status(&mut self, status: Status, message: &str) -> Result<()> {
        let line = render::status_line(status, message, Local::now().time());
        self.write(&line)
    }

    fn write(&mut self, text: &str) -> Result<()> {
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}
