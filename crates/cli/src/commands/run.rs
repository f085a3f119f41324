//! `naruhod <TASK>`: run one task to completion.

use naruhod_agent::{
    ActionDispatcher, ConversationDriver, ConversationOutcome, PromptFactory, ProviderGateway,
    TurnRunner, render_directory,
};
use naruhod_config::AppConfig;
use naruhod_core::{ActionSchema, EventBus};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

pub async fn run(
    task: &str,
    config_path: &Path,
    allow_shell: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    // Check for API key early: give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!("    NARUHOD_API_KEY=sk-...   (takes precedence)");
        eprintln!();
        eprintln!("  Or add `api_key` to your config file:");
        eprintln!("    {}", config_path.display());
        eprintln!("  (naruhod --init-config writes a default one)");
        eprintln!();
        std::process::exit(1);
    }

    let event_bus = Arc::new(EventBus::default());
    spawn_event_logger(&event_bus);

    let provider = Arc::new(naruhod_providers::build_from_config(&config)?);

    let shell_enabled = allow_shell || config.shell.enabled;
    let executor = naruhod_tools::build_executor(shell_enabled);

    let schema = config.agent.action_schema;
    if schema == ActionSchema::V1 {
        warn!("Action schema v1 is deprecated; set agent.action_schema = \"v2\"");
    }

    let directory_structure = if config.agent.scan_directory {
        let cwd = std::env::current_dir()?;
        render_directory(&cwd, &config.agent.scan_excludes).unwrap_or_else(|e| {
            warn!("Directory scan failed: {e}");
            "{}".into()
        })
    } else {
        "(not scanned)".into()
    };

    let dispatcher = ActionDispatcher::new(executor, event_bus.clone())
        .with_schema(schema)
        .with_activity_log(config.agent.activity_log);
    let gateway = Arc::new(ProviderGateway::from_config(
        provider,
        &config,
        event_bus.clone(),
    ));
    let driver = ConversationDriver::new(
        TurnRunner::new(dispatcher),
        gateway,
        PromptFactory::new(directory_structure, schema),
        event_bus,
    );

    info!(
        model = %config.model,
        shell = shell_enabled,
        "Running task"
    );

    match driver.start(task).await? {
        ConversationOutcome::Done { report, turns } => {
            println!("✅ Task done after {turns} turn(s)");
            if !report.is_empty() {
                println!("{report}");
            }
        }
        ConversationOutcome::Rejected { reason, turns } => {
            println!("⛔ Task rejected after {turns} turn(s)");
            if !reason.is_empty() {
                println!("{reason}");
            }
        }
    }

    Ok(())
}

/// Mirror domain events into the debug log.
fn spawn_event_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(event = ?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}
