//! Shell executor: run the model's commands through the system shell.
//!
//! No timeout, no output cap, no allowlist: the command runs to completion
//! with the same privileges, environment and working directory as naruhod.

use async_trait::async_trait;
use naruhod_core::{CommandExecutor, CommandOutput};
use serde::Serialize;
use std::process::{ExitStatus, Output};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, warn};

/// Executes commands with `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    fn shell(command: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }

    /// Turn a finished process into a command outcome.
    fn capture(command: &str, output: Output) -> CommandOutput {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            return CommandOutput::success(stdout.trim_end()).with_diagnostic(&stderr);
        }

        let diagnostic = FailureDiagnostic {
            message: format!("Command failed: {command}\n{}", stderr.trim_end()),
            code: output.status.code(),
            signal: exit_signal(&output.status),
            stdout: stdout.into_owned(),
            stderr: stderr.into_owned(),
        };
        warn!(
            command = %command,
            exit_code = ?diagnostic.code,
            signal = ?diagnostic.signal,
            "Command failed"
        );
        CommandOutput::failure(diagnostic.to_json())
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    fn name(&self) -> &str {
        "shell"
    }

    async fn execute(&self, command: &str) -> CommandOutput {
        debug!(command = %command, "Executing shell command");
        let start = Instant::now();

        let outcome = match Self::shell(command).output().await {
            Ok(output) => Self::capture(command, output),
            Err(e) => {
                warn!(command = %command, error = %e, "Failed to spawn shell");
                CommandOutput::failure(
                    FailureDiagnostic {
                        message: format!("Failed to spawn shell: {e}"),
                        code: None,
                        signal: None,
                        stdout: String::new(),
                        stderr: String::new(),
                    }
                    .to_json(),
                )
            }
        };

        debug!(
            command = %command,
            duration_ms = start.elapsed().as_millis() as u64,
            "Command finished"
        );
        outcome
    }
}

/// What the model sees in `error` when a command fails.
#[derive(Debug, Serialize)]
struct FailureDiagnostic {
    message: String,
    code: Option<i32>,
    signal: Option<i32>,
    stdout: String,
    stderr: String,
}

impl FailureDiagnostic {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn diagnostic(out: &CommandOutput) -> serde_json::Value {
        serde_json::from_str(out.error.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn execute_echo() {
        let out = ShellExecutor::new().execute("echo hello").await;
        assert_eq!(out.output, "hello");
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn trims_only_trailing_whitespace() {
        let out = ShellExecutor::new().execute("printf '  a b  \\n\\n'").await;
        assert_eq!(out.output, "  a b");
    }

    #[tokio::test]
    async fn stderr_on_success_is_diagnostic() {
        let out = ShellExecutor::new().execute("echo out; echo careful >&2").await;
        assert_eq!(out.output, "out");
        assert_eq!(out.error.as_deref(), Some("careful"));
        assert!(out.success);
    }

    #[tokio::test]
    async fn stderr_only_success_is_not_a_failure() {
        let out = ShellExecutor::new().execute("echo warn >&2").await;
        assert!(out.success);
        assert_eq!(out.output, "");
        assert_eq!(out.error.as_deref(), Some("warn"));
    }

    #[tokio::test]
    async fn missing_binary_fails_with_diagnostic() {
        let out = ShellExecutor::new()
            .execute("definitely-not-a-real-binary-naruhod")
            .await;
        assert_eq!(out.output, "");
        let diag = diagnostic(&out);
        assert_eq!(diag["code"], 127);
        assert!(diag["message"].as_str().unwrap().contains("Command failed"));
        assert!(!diag["stderr"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn nonzero_exit_keeps_partial_output_in_diagnostic() {
        let out = ShellExecutor::new().execute("echo partial; exit 3").await;
        assert_eq!(out.output, "");
        let diag = diagnostic(&out);
        assert_eq!(diag["code"], 3);
        assert_eq!(diag["stdout"], "partial\n");
        assert!(diag["signal"].is_null());
    }

    #[tokio::test]
    async fn killed_by_signal() {
        let out = ShellExecutor::new().execute("kill -9 $$").await;
        assert_eq!(out.output, "");
        let diag = diagnostic(&out);
        assert_eq!(diag["signal"], 9);
        assert!(diag["code"].is_null());
    }

    #[tokio::test]
    async fn side_effects_are_visible_to_later_commands() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("note.txt");
        let executor = ShellExecutor::new();

        executor
            .execute(&format!("echo first > {}", file.display()))
            .await;
        let out = executor.execute(&format!("cat {}", file.display())).await;
        assert_eq!(out.output, "first");
    }
}
