//! The pip-backed [`Installer`]: binary detection and the four package subcommands.

use super::parser::{parse_listing, parse_outdated, Listing};
use super::process;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::OutputFormat;
use std::time::Duration;
use tracing::{debug, info};

/// Package operations the menu needs from an installer.
#[allow(async_fn_in_trait)]
pub trait Installer {
    /// Human-readable form of the resolved command, e.g. `python3 -m pip`.
    fn command_line(&self) -> String;

    /// All installed packages.
    async fn list_installed(&self) -> Result<Listing>;

    /// Installed packages that have a newer release.
    async fn list_outdated(&self) -> Result<Listing>;

    /// Upgrades one package. Returns pip's `Successfully installed ...` line when it printed one.
    async fn upgrade(&self, name: &str) -> Result<String>;

    /// Uninstalls one package without asking pip for confirmation.
    async fn uninstall(&self, name: &str) -> Result<()>;
}

/// Shells out to a resolved pip command.
#[derive(Debug, Clone)]
pub struct PipInstaller {
    command: Vec<String>,
    version_banner: String,
    format: OutputFormat,
    command_timeout: Duration,
    update_timeout: Duration,
}

impl PipInstaller {
    /// Probes the configured candidates with `--version` and keeps the first that answers.
    pub async fn detect(config: &Config) -> Result<Self> {
        let candidates = config.installer_candidates();
        for candidate in &candidates {
            let mut probe = candidate.clone();
            probe.push("--version".to_string());
            match process::run(&probe, config.probe_timeout).await {
                Ok(output) => {
                    let banner = output.stdout.trim().to_string();
                    info!("Using {}: {}", candidate.join(" "), banner);
                    return Ok(Self::with_command(candidate.clone(), banner, config));
                },
                Err(e) => debug!("Installer candidate `{}` rejected: {}", candidate.join(" "), e),
            }
        }

        Err(AppError::ProcessNotFound {
            candidates: candidates.iter().map(|c| c.join(" ")).collect(),
        })
    }

    /// Wraps an already-known command without probing it.
    pub fn with_command(command: Vec<String>, version_banner: String, config: &Config) -> Self {
        Self {
            command,
            version_banner,
            format: config.format,
            command_timeout: config.command_timeout,
            update_timeout: config.update_timeout,
        }
    }

    /// What `--version` printed during detection.
    pub fn version_banner(&self) -> &str {
        &self.version_banner
    }

    fn build(&self, args: &[&str]) -> Vec<String> {
        self.command
            .iter()
            .cloned()
            .chain(args.iter().map(|a| a.to_string()))
            .collect()
    }
}

impl Installer for PipInstaller {
    fn command_line(&self) -> String {
        self.command.join(" ")
    }

    async fn list_installed(&self) -> Result<Listing> {
        let cmd = self.build(&["list", self.format.as_flag()]);
        let output = process::run(&cmd, self.command_timeout).await?;
        parse_listing(&output.stdout, self.format)
    }

    async fn list_outdated(&self) -> Result<Listing> {
        let cmd = self.build(&["list", "--outdated", self.format.as_flag()]);
        let output = process::run(&cmd, self.command_timeout).await?;
        parse_outdated(&output.stdout, self.format)
    }

    async fn upgrade(&self, name: &str) -> Result<String> {
        let cmd = self.build(&["install", "--upgrade", name]);
        let output = process::run(&cmd, self.update_timeout).await?;
        Ok(installed_summary(&output.stdout))
    }

    async fn uninstall(&self, name: &str) -> Result<()> {
        let cmd = self.build(&["uninstall", "-y", name]);
        process::run(&cmd, self.command_timeout).await?;
        Ok(())
    }
}

/// Picks pip's `Successfully installed foo-1.2` line out of install output.
fn installed_summary(stdout: &str) -> String {
    stdout
        .lines()
        .find(|line| line.contains("Successfully installed"))
        .map(|line| line.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PackageRecord;

    /// A fake pip: a shell script that answers the subcommands this crate issues.
    const FAKE_PIP: &str = r#"
case "$*" in
  "--version") echo "pip 24.0 from /fake (python 3.12)" ;;
  "list --format=json") echo '[{"name": "requests", "version": "2.31.0"}, {"name": "numpy", "version": "1.26.0"}]' ;;
  "list --outdated --format=json") echo '[{"name": "numpy", "version": "1.26.0", "latest_version": "2.0.0", "latest_filetype": "wheel"}]' ;;
  "list --format=columns") printf 'Package  Version\n-------- -------\nrequests 2.31.0\n' ;;
  "install --upgrade numpy") echo "Collecting numpy"; echo "Successfully installed numpy-2.0.0" ;;
  "uninstall -y requests") echo "Successfully uninstalled requests-2.31.0" ;;
  *) echo "ERROR: unexpected arguments: $*" >&2; exit 1 ;;
esac
"#;

    fn fake_config(format: OutputFormat) -> Config {
        Config {
            installer_override: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                FAKE_PIP.to_string(),
                "pip".to_string(),
            ]),
            format,
            ..Config::default()
        }
    }

    fn fake_installer(format: OutputFormat) -> PipInstaller {
        let config = fake_config(format);
        let command = config.installer_override.clone().unwrap();
        PipInstaller::with_command(command, String::new(), &config)
    }

    #[tokio::test]
    async fn test_detect_prefers_override() {
        let config = fake_config(OutputFormat::Json);
        let pip = PipInstaller::detect(&config).await.unwrap();
        assert_eq!(pip.version_banner(), "pip 24.0 from /fake (python 3.12)");
        assert!(pip.command_line().starts_with("sh -c"));
    }

    #[tokio::test]
    async fn test_detect_reports_every_candidate_when_none_answer() {
        let missing = |name: &str| vec![name.to_string()];
        let config = Config {
            installer_override: Some(missing("pip-manager-missing-override")),
            fallback_candidates: vec![
                missing("pip-manager-missing-pip3"),
                vec!["pip-manager-missing-python3".to_string(), "-m".to_string(), "pip".to_string()],
            ],
            ..Config::default()
        };

        let err = PipInstaller::detect(&config).await.unwrap_err();
        match err {
            AppError::ProcessNotFound { candidates } => assert_eq!(
                candidates,
                vec![
                    "pip-manager-missing-override",
                    "pip-manager-missing-pip3",
                    "pip-manager-missing-python3 -m pip",
                ]
            ),
            other => panic!("Expected ProcessNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_detect_skips_candidate_that_fails_version() {
        let config = Config {
            installer_override: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "exit 1".to_string(),
            ]),
            fallback_candidates: vec![fake_config(OutputFormat::Json).installer_override.unwrap()],
            ..Config::default()
        };

        let pip = PipInstaller::detect(&config).await.unwrap();
        assert_eq!(pip.version_banner(), "pip 24.0 from /fake (python 3.12)");
    }

    #[tokio::test]
    async fn test_list_installed_json() {
        let listing = fake_installer(OutputFormat::Json).list_installed().await.unwrap();
        assert_eq!(
            listing.packages,
            vec![
                PackageRecord::installed("requests", "2.31.0"),
                PackageRecord::installed("numpy", "1.26.0"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_installed_columns() {
        let listing = fake_installer(OutputFormat::Columns)
            .list_installed()
            .await
            .unwrap();
        assert_eq!(listing.packages, vec![PackageRecord::installed("requests", "2.31.0")]);
    }

    #[tokio::test]
    async fn test_list_outdated() {
        let listing = fake_installer(OutputFormat::Json).list_outdated().await.unwrap();
        assert_eq!(
            listing.packages,
            vec![PackageRecord::outdated("numpy", "1.26.0", "2.0.0")]
        );
    }

    #[tokio::test]
    async fn test_upgrade_reports_success_line() {
        let line = fake_installer(OutputFormat::Json).upgrade("numpy").await.unwrap();
        assert_eq!(line, "Successfully installed numpy-2.0.0");
    }

    #[tokio::test]
    async fn test_uninstall_failure_carries_stderr() {
        let pip = fake_installer(OutputFormat::Json);
        pip.uninstall("requests").await.unwrap();

        let err = pip.uninstall("missing").await.unwrap_err();
        match err {
            AppError::ProcessFailed { stderr, .. } => assert!(stderr.contains("unexpected arguments")),
            other => panic!("Expected ProcessFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_installed_summary_without_marker() {
        assert_eq!(installed_summary("Requirement already satisfied: numpy"), "");
    }
}
