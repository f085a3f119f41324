//! Executor used when shell execution has not been granted.

use async_trait::async_trait;
use naruhod_core::{CommandExecutor, CommandOutput};
use tracing::info;

/// Message returned to the model for every refused command.
pub const DISABLED_MESSAGE: &str =
    "command execution is disabled for this run; the operator must pass --allow-shell \
     or set shell.enabled = true to permit it";

/// Refuses every command without spawning anything.
pub struct DisabledExecutor;

#[async_trait]
impl CommandExecutor for DisabledExecutor {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn execute(&self, command: &str) -> CommandOutput {
        info!(command = %command, "Refusing command: shell execution not granted");
        CommandOutput::failure(DISABLED_MESSAGE)
    }
}
