//! Everything that talks to the external package installer.
//!
//! Includes:
//! - `process`: running a command with a timeout.
//! - `parser`: turning `pip list` output into records.
//! - `pip`: the `Installer` trait and its pip implementation.

pub mod parser;
mod pip;
pub mod process;

pub use pip::*;
