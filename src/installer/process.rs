//! Runs one installer command as a child process with a hard time bound.

use crate::error::{AppError, Result};
use crate::models::CommandResult;
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, error, warn};

/// Runs `command` (program followed by its arguments) and collects its output.
///
/// The child gets no stdin, so an installer that unexpectedly asks a question
/// sees EOF instead of hanging on the menu's terminal. Stdout and stderr are read
/// to completion before the result is returned.
///
/// Errors:
/// - `ProcessNotFound` when the program does not exist.
/// - `ProcessTimeout` when `timeout` elapses. The child's whole process group is
///   killed and the child reaped first, so helpers it started do not outlive it.
/// - `ProcessFailed` on a non-zero exit, carrying stderr.
pub async fn run(command: &[String], timeout: Duration) -> Result<CommandResult> {
    let (program, args) = command.split_first().ok_or_else(|| AppError::ProcessNotFound {
        candidates: Vec::new(),
    })?;
    let command_line = command.join(" ");
    debug!("Running `{}` (timeout {:?})", command_line, timeout);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own group, so a timeout can take down pip's build backends along with pip.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                debug!("`{}` is not on the search path", program);
                AppError::ProcessNotFound {
                    candidates: vec![command_line.clone()],
                }
            } else {
                error!("Failed to start `{}`: {}", command_line, e);
                AppError::Spawn {
                    command: command_line.clone(),
                    source: Arc::new(e),
                }
            }
        })?;

    let collected = tokio::time::timeout(timeout, collect_output(&mut child)).await;

    let (status, stdout, stderr) = match collected {
        Ok(output) => output?,
        Err(_) => {
            warn!("`{}` exceeded {:?}, killing it", command_line, timeout);
            kill_process_group(&child);
            if let Err(e) = child.kill().await {
                error!("Failed to kill `{}`: {}", command_line, e);
            }
            return Err(AppError::ProcessTimeout {
                command: command_line,
                timeout,
            });
        },
    };

    let result = CommandResult {
        exit_code: status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
    };

    if !status.success() {
        debug!("`{}` exited with {}", command_line, result.exit_code);
        return Err(AppError::ProcessFailed {
            command: command_line,
            code: result.exit_code,
            stderr: result.stderr.trim().to_string(),
        });
    }

    Ok(result)
}

/// Sends SIGKILL to every process in the child's group.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let Some(pid) = child.id() else {
        return;
    };
    // SAFETY: plain syscall; the group id is the child's pid because of `process_group(0)`.
    if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } != 0 {
        debug!(
            "killpg({}) failed: {}",
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

/// Drains both pipes concurrently so a chatty stderr cannot block stdout, then waits.
async fn collect_output(child: &mut Child) -> Result<(ExitStatus, Vec<u8>, Vec<u8>)> {
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let read_stdout = async {
        match stdout_pipe.as_mut() {
            Some(pipe) => pipe.read_to_end(&mut stdout).await.map(|_| ()),
            None => Ok(()),
        }
    };
    let read_stderr = async {
        match stderr_pipe.as_mut() {
            Some(pipe) => pipe.read_to_end(&mut stderr).await.map(|_| ()),
            None => Ok(()),
        }
    };
    let (out_res, err_res) = tokio::join!(read_stdout, read_stderr);
    out_res?;
    err_res?;

    let status = child.wait().await?;
    Ok((status, stdout, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    /// A killed process that nobody has reaped yet counts as gone.
    fn process_alive(pid: &str) -> bool {
        let proc_dir = std::path::Path::new("/proc");
        if proc_dir.exists() {
            return match std::fs::read_to_string(proc_dir.join(pid).join("stat")) {
                // Fields after the parenthesised command name start with the state.
                Ok(stat) => stat
                    .rsplit_once(')')
                    .and_then(|(_, rest)| rest.split_whitespace().next())
                    .map_or(false, |state| state != "Z" && state != "X"),
                Err(_) => false,
            };
        }
        std::process::Command::new("kill")
            .args(["-0", pid])
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Signals are delivered asynchronously; give the kernel a moment.
    async fn wait_until_gone(pid: &str) -> bool {
        for _ in 0..50 {
            if !process_alive(pid) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    #[tokio::test]
    async fn test_collects_stdout_and_stderr() {
        let result = run(
            &cmd(&["sh", "-c", "echo out; echo err >&2"]),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
    }

    #[tokio::test]
    async fn test_non_zero_exit_surfaces_stderr() {
        let err = run(
            &cmd(&["sh", "-c", "echo 'no such package' >&2; exit 3"]),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        match err {
            AppError::ProcessFailed { code, stderr, .. } => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "no such package");
            },
            other => panic!("Expected ProcessFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let err = run(
            &cmd(&["pip-manager-definitely-missing-binary", "--version"]),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ProcessNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_command_is_not_found() {
        let err = run(&[], Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, AppError::ProcessNotFound { .. }));
    }

    #[tokio::test]
    async fn test_stdin_is_closed() {
        let result = run(&cmd(&["cat"]), Duration::from_secs(5)).await.unwrap();
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_kills_the_child() {
        let pid_file = std::env::temp_dir().join(format!(
            "pip-manager-timeout-{}.pid",
            std::process::id()
        ));
        let script = format!("echo $$ > {}; exec sleep 5", pid_file.display());

        let started = Instant::now();
        let err = run(&cmd(&["sh", "-c", &script]), Duration::from_secs(1))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, AppError::ProcessTimeout { .. }));
        assert!(
            elapsed <= Duration::from_millis(1200),
            "timeout took {:?}",
            elapsed
        );

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let _ = std::fs::remove_file(&pid_file);
        assert!(wait_until_gone(pid.trim()).await, "child {} still running", pid.trim());
    }

    #[tokio::test]
    async fn test_timeout_kills_background_grandchild() {
        let pid_file = std::env::temp_dir().join(format!(
            "pip-manager-grandchild-{}.pid",
            std::process::id()
        ));
        let script = format!("sleep 30 & echo $! > {}; wait", pid_file.display());

        let err = run(&cmd(&["sh", "-c", &script]), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProcessTimeout { .. }));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let _ = std::fs::remove_file(&pid_file);
        assert!(
            wait_until_gone(pid.trim()).await,
            "grandchild {} outlived the timeout",
            pid.trim()
        );
    }
}
