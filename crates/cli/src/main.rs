//! naruhod CLI: the main entry point.
//!
//! ```text
//! naruhod [--allow-shell] [-v] [-c <PATH>] "<task description>"
//! naruhod --init-config [-c <PATH>]
//! ```

use clap::Parser;
use naruhod_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "naruhod",
    about = "Let a language model work through a task, one batch of actions at a time",
    version,
    author
)]
struct Cli {
    /// What the model should do
    #[arg(value_name = "TASK_DESCRIPTION", required_unless_present = "init_config")]
    task: Option<String>,

    /// Let the model's commands run in the system shell, unsandboxed
    #[arg(long)]
    allow_shell: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of ~/.naruhod/config.toml
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    if cli.init_config {
        return commands::init::run(&config_path);
    }

    let task = cli.task.ok_or("a task description is required")?;
    commands::run::run(&task, &config_path, cli.allow_shell).await
}
