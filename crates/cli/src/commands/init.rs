//! `naruhod --init-config`: write a default config file.

use naruhod_config::AppConfig;
use std::path::Path;

pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        println!("Config already exists at: {}", path.display());
        println!("Edit it manually or delete it and re-run with --init-config.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, AppConfig::default_toml())?;

    println!("Created {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add `api_key = \"sk-...\"` to it, or export OPENAI_API_KEY");
    println!("  2. Run: naruhod \"<task description>\"");
    println!("     (add --allow-shell to let the model run commands)");
    Ok(())
}
