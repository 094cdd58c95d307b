//! Runtime configuration, built once at startup from the environment.
//!
//! A `.env` file in the working directory is honoured through `dotenv`. The resulting
//! [`Config`] is passed down explicitly; nothing here is stored globally.

use crate::error::{AppError, Result};
use crate::models::OutputFormat;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_INSTALLER: &str = "PIP_MANAGER_INSTALLER";
pub const ENV_FORMAT: &str = "PIP_MANAGER_FORMAT";
pub const ENV_TIMEOUT: &str = "PIP_MANAGER_TIMEOUT_SECS";
pub const ENV_UPDATE_TIMEOUT: &str = "PIP_MANAGER_UPDATE_TIMEOUT_SECS";
pub const ENV_PROBE_TIMEOUT: &str = "PIP_MANAGER_PROBE_TIMEOUT_SECS";
pub const ENV_COLOR: &str = "PIP_MANAGER_COLOR";
pub const ENV_LOG_DIR: &str = "PIP_MANAGER_LOG_DIR";

/// Installer commands tried in order when no override is set.
pub const DEFAULT_CANDIDATES: [&str; 4] = ["pip3", "pip", "python3 -m pip", "python -m pip"];

/// Whether ANSI colors are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Colorize only when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Applies the mode to the process-wide `colored` switch.
    pub fn apply(self) {
        match self {
            ColorMode::Auto => colored::control::unset_override(),
            ColorMode::Always => colored::control::set_override(true),
            ColorMode::Never => colored::control::set_override(false),
        }
    }
}

impl FromStr for ColorMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" | "yes" | "on" => Ok(ColorMode::Always),
            "never" | "no" | "off" => Ok(ColorMode::Never),
            other => Err(AppError::Config(format!(
                "{}: unknown color mode '{}' (expected auto, always or never)",
                ENV_COLOR, other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Preferred installer command, already split on whitespace.
    pub installer_override: Option<Vec<String>>,
    /// Commands tried after the override, in order.
    pub fallback_candidates: Vec<Vec<String>>,
    pub format: OutputFormat,
    /// Bound for listing and uninstall commands.
    pub command_timeout: Duration,
    /// Bound for `install --upgrade`.
    pub update_timeout: Duration,
    /// Bound for each `--version` probe during detection.
    pub probe_timeout: Duration,
    pub color: ColorMode,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            installer_override: None,
            fallback_candidates: DEFAULT_CANDIDATES
                .iter()
                .map(|c| c.split_whitespace().map(str::to_string).collect())
                .collect(),
            format: OutputFormat::Json,
            command_timeout: Duration::from_secs(120),
            update_timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(10),
            color: ColorMode::Auto,
            log_dir: None,
        }
    }
}

impl Config {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let installer_override = get(ENV_INSTALLER).map(|raw| {
            raw.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

        let format = match get(ENV_FORMAT) {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("{}: {}", ENV_FORMAT, e)))?,
            None => defaults.format,
        };

        Ok(Self {
            installer_override,
            fallback_candidates: defaults.fallback_candidates,
            format,
            command_timeout: parse_secs(ENV_TIMEOUT, get(ENV_TIMEOUT), defaults.command_timeout)?,
            update_timeout: parse_secs(
                ENV_UPDATE_TIMEOUT,
                get(ENV_UPDATE_TIMEOUT),
                defaults.update_timeout,
            )?,
            probe_timeout: parse_secs(
                ENV_PROBE_TIMEOUT,
                get(ENV_PROBE_TIMEOUT),
                defaults.probe_timeout,
            )?,
            color: match get(ENV_COLOR) {
                Some(raw) => raw.parse()?,
                None => defaults.color,
            },
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        })
    }

    /// Installer commands to probe, override first.
    pub fn installer_candidates(&self) -> Vec<Vec<String>> {
        let mut candidates: Vec<Vec<String>> = Vec::new();
        if let Some(cmd) = &self.installer_override {
            candidates.push(cmd.clone());
        }
        for cmd in &self.fallback_candidates {
            if !candidates.contains(cmd) {
                candidates.push(cmd.clone());
            }
        }
        candidates
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: Duration) -> Result<Duration> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::Config(format!(
            "{}: expected a positive number of seconds, got '{}'",
            key, raw
        ))),
    }
}
