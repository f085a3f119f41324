//! Command executor trait: the abstraction over running shell commands.
//!
//! The executor is what gives the agent the ability to act in the world.
//! It is deliberately infallible at the type level: every failure (spawn
//! error, non-zero exit, signal) is captured into [`CommandOutput::error`]
//! so the model can see it and react on its next turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The captured outcome of one command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Standard output with trailing whitespace trimmed; empty on failure
    pub output: String,

    /// Diagnostic text: trimmed stderr on success, a JSON bundle on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Whether the command completed normally. A successful command may
    /// still carry stderr in `error`.
    #[serde(default)]
    pub success: bool,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: None,
            success: true,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            error: Some(error.into()),
            success: false,
        }
    }

    /// Attach stderr from a successful run. Blank text is dropped.
    pub fn with_diagnostic(mut self, stderr: &str) -> Self {
        let stderr = stderr.trim();
        self.error = (!stderr.is_empty()).then(|| stderr.to_string());
        self
    }
}

/// The core CommandExecutor trait.
///
/// Implementations run one command to completion and never return early
/// with an error; see `naruhod-tools` for the shell-backed one.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// A short name for logs (e.g., "shell", "disabled").
    fn name(&self) -> &str;

    /// Run `command` and capture its outcome.
    async fn execute(&self, command: &str) -> CommandOutput;
}
