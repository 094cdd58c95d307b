//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the (flag-less) argument parser, the menu states, and the controller that
//! drives the interactive loop.

mod commands;

pub use commands::*;
use clap::Parser;

/// Interactive menu for listing, updating, and removing pip packages.
///
/// Set PIP_MANAGER_INSTALLER to choose the pip command (e.g. "python3.12 -m pip").
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {}

/// Entries of the main menu, in display order. Entry `n` is chosen by typing `n`.
pub const MENU_OPTIONS: [&str; 5] = [
    "List all installed packages",
    "Check for outdated packages",
    "Update all outdated packages",
    "Remove specific packages",
    "Exit",
];

/// Where the menu loop is. Every action state falls back to `Menu` when it finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Menu,
    Listing,
    CheckingOutdated,
    Updating,
    Removing,
    Exit,
}

impl MenuState {
    /// Maps a typed menu choice to the state it selects; `None` for anything invalid.
    pub fn from_choice(input: &str) -> Option<Self> {
        match input.trim().parse::<usize>().ok()? {
            1 => Some(MenuState::Listing),
            2 => Some(MenuState::CheckingOutdated),
            3 => Some(MenuState::Updating),
            4 => Some(MenuState::Removing),
            5 => Some(MenuState::Exit),
            _ => None,
        }
    }
}
