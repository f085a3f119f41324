//! Configuration loading, validation, and management for naruhod.
//!
//! Loads configuration from `~/.naruhod/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use naruhod_core::{ActionSchema, ActivityLogPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.naruhod/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model to ask for instructions
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Max tokens per model reply (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Request a JSON-object reply from the endpoint
    #[serde(default = "default_true")]
    pub json_mode: bool,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Shell execution capability
    #[serde(default)]
    pub shell: ShellConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4-turbo".into()
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("json_mode", &self.json_mode)
            .field("agent", &self.agent)
            .field("shell", &self.shell)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Which generation of the action vocabulary is active
    #[serde(default)]
    pub action_schema: ActionSchema,

    /// Whether activity-log entries replace or accumulate
    #[serde(default)]
    pub activity_log: ActivityLogPolicy,

    /// Embed the working directory layout in every prompt
    #[serde(default = "default_true")]
    pub scan_directory: bool,

    /// Directory names skipped by the scan
    #[serde(default = "default_scan_excludes")]
    pub scan_excludes: Vec<String>,
}

fn default_scan_excludes() -> Vec<String> {
    ["node_modules", ".git", ".idea", "dist", "target"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            action_schema: ActionSchema::default(),
            activity_log: ActivityLogPolicy::default(),
            scan_directory: true,
            scan_excludes: default_scan_excludes(),
        }
    }
}

/// Shell execution is an explicit trust boundary: the model's commands run
/// unsandboxed with the caller's privileges, so it is off unless granted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl AppConfig {
    /// Load configuration from the default path (~/.naruhod/config.toml).
    ///
    /// Also checks environment variables:
    /// - `NARUHOD_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `NARUHOD_MODEL`, `NARUHOD_API_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply process environment overrides.
    pub fn load_with(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // A blank key in the file counts as unset.
        self.api_key = self.api_key.take().filter(|k| !k.trim().is_empty());

        if let Some(key) = lookup("NARUHOD_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        } else if self.api_key.is_none() {
            self.api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        }

        if let Some(model) = lookup("NARUHOD_MODEL") {
            self.model = model;
        }

        if let Some(url) = lookup("NARUHOD_API_URL") {
            self.api_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".naruhod")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "api_url must be an http(s) URL, got '{}'",
                self.api_url
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            temperature: 0.0,
            max_tokens: None,
            json_mode: true,
            agent: AgentSettings::default(),
            shell: ShellConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for naruhod_core::Error {
    fn from(err: ConfigError) -> Self {
        naruhod_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.model, "gpt-4-turbo");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.agent.action_schema, ActionSchema::V2);
        assert_eq!(config.agent.activity_log, ActivityLogPolicy::Accumulate);
        assert!(!config.shell.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.agent.scan_excludes, config.agent.scan_excludes);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_http_url_rejected() {
        let config = AppConfig {
            api_url: "ftp://example.com".into(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model, "gpt-4-turbo");
        assert!(!config.has_api_key());
    }

    #[test]
    fn parses_agent_and_shell_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "gpt-4o"
temperature = 0.2

[agent]
action_schema = "v1"
activity_log = "overwrite"
scan_directory = false

[shell]
enabled = true
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.agent.action_schema, ActionSchema::V1);
        assert_eq!(config.agent.activity_log, ActivityLogPolicy::Overwrite);
        assert!(!config.agent.scan_directory);
        assert!(config.shell.enabled);
        // Unspecified fields keep their defaults
        assert!(config.agent.scan_excludes.contains(&"node_modules".to_string()));
        assert!(config.json_mode);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_key_precedence() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-openai"), ("NARUHOD_API_KEY", "sk-naruhod")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-naruhod"));

        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn file_key_wins_over_openai_env() {
        let mut config = AppConfig {
            api_key: Some("sk-file".into()),
            ..AppConfig::default()
        };
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn empty_env_key_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("OPENAI_API_KEY", "")]));
        assert!(!config.has_api_key());
    }

    #[test]
    fn blank_file_key_is_not_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_key = \"\"\n").unwrap();

        let mut config = AppConfig::load_from(&path).unwrap();
        assert!(!config.has_api_key());

        config.apply_env(env(&[]));
        assert!(config.api_key.is_none());

        config.api_key = Some("  ".into());
        config.apply_env(env(&[("OPENAI_API_KEY", "sk-openai")]));
        assert_eq!(config.api_key.as_deref(), Some("sk-openai"));
    }

    #[test]
    fn env_overrides_model_and_url() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("NARUHOD_MODEL", "gpt-4o-mini"),
            ("NARUHOD_API_URL", "http://localhost:11434/v1"),
        ]));
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_url, "http://localhost:11434/v1");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gpt-4-turbo"));
        assert!(toml_str.contains("accumulate"));
    }
}
