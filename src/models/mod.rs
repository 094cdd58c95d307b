//! Defines the data structures and models used throughout the application.
//!
//! These are the values that flow between the installer layer and the UI: package
//! records parsed from pip output, raw command results, and batch outcomes.

mod package;

pub use package::*;
