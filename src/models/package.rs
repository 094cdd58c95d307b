//! Package records and command results exchanged between the installer and the menu.

use crate::error::{AppError, Result};
use std::fmt;
use std::str::FromStr;

/// One package as reported by the installer.
///
/// `latest_version` is only set for records produced by an outdated check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub installed_version: String,
    pub latest_version: Option<String>,
}

impl PackageRecord {
    /// A record from a plain installed listing.
    pub fn installed(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version: version.into(),
            latest_version: None,
        }
    }

    /// A record from an outdated listing.
    pub fn outdated(
        name: impl Into<String>,
        version: impl Into<String>,
        latest: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            installed_version: version.into(),
            latest_version: Some(latest.into()),
        }
    }

    /// The name in pip's normalized form, used for lookups and duplicate detection.
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.name)
    }
}

/// Normalizes a distribution name the way pip compares them:
/// case-insensitive, with runs of `-`, `_` and `.` treated as one `-`.
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            pending_dash = true;
            continue;
        }
        if pending_dash && !out.is_empty() {
            out.push('-');
        }
        pending_dash = false;
        out.extend(c.to_lowercase());
    }
    out
}

/// Raw result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Listing format requested from the installer. Drives both the `--format` flag
/// and which parser handles the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Columns,
}

impl OutputFormat {
    pub fn as_flag(self) -> &'static str {
        match self {
            OutputFormat::Json => "--format=json",
            OutputFormat::Columns => "--format=columns",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "columns" | "column" | "table" => Ok(OutputFormat::Columns),
            other => Err(AppError::Config(format!(
                "unknown output format '{}' (expected json or columns)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Columns => write!(f, "columns"),
        }
    }
}

/// Per-package results of an update or removal batch.
///
/// Every package is its own unit of work: one failure never rolls back or
/// stops the others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Percentage of packages that succeeded; 100 when nothing ran.
    pub fn completion_rate(&self) -> f64 {
        if self.total() == 0 {
            return 100.0;
        }
        self.succeeded.len() as f64 / self.total() as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("requests", "requests")]
    #[case("Django", "django")]
    #[case("typing_extensions", "typing-extensions")]
    #[case("zope.interface", "zope-interface")]
    #[case("Foo__Bar--baz", "foo-bar-baz")]
    #[case("  numpy ", "numpy")]
    fn test_canonical_name(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(canonical_name(raw), expected);
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "columns".parse::<OutputFormat>().unwrap(),
            OutputFormat::Columns
        );
        assert!(matches!(
            "yaml".parse::<OutputFormat>(),
            Err(AppError::Config(_))
        ));
        assert_eq!(OutputFormat::Columns.as_flag(), "--format=columns");
    }

    #[test]
    fn test_completion_rate() {
        assert_eq!(BatchOutcome::default().completion_rate(), 100.0);

        let outcome = BatchOutcome {
            succeeded: vec!["requests".to_string()],
            failed: vec!["numpy - boom".to_string()],
        };
        assert_eq!(outcome.total(), 2);
        assert_eq!(outcome.completion_rate(), 50.0);
    }

    #[test]
    fn test_record_constructors() {
        let installed = PackageRecord::installed("Requests", "2.31.0");
        assert_eq!(installed.latest_version, None);
        assert_eq!(installed.canonical_name(), "requests");

        let outdated = PackageRecord::outdated("numpy", "1.26.0", "2.0.0");
        assert_eq!(outdated.latest_version.as_deref(), Some("2.0.0"));
    }
}
