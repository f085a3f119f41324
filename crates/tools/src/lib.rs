//! Command executors for naruhod.
//!
//! - [`ShellExecutor`] runs the model's commands through the system shell,
//!   unsandboxed, with the caller's privileges and working directory.
//! - [`DisabledExecutor`] refuses every command. It is wired in unless the
//!   operator explicitly grants shell execution.

pub mod disabled;
pub mod shell;

use std::sync::Arc;

use naruhod_core::CommandExecutor;

pub use disabled::DisabledExecutor;
pub use shell::ShellExecutor;

/// Pick the executor for a run.
///
/// `shell_enabled` is the operator's opt-in (`--allow-shell` or
/// `shell.enabled = true`); without it commands are refused, not run.
pub fn build_executor(shell_enabled: bool) -> Arc<dyn CommandExecutor> {
    if shell_enabled {
        tracing::warn!("Shell execution enabled: model commands run unsandboxed");
        Arc::new(ShellExecutor::new())
    } else {
        Arc::new(DisabledExecutor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn executor_follows_grant() {
        assert_eq!(build_executor(true).name(), "shell");
        assert_eq!(build_executor(false).name(), "disabled");
    }
}
