//! LLM Provider implementations for naruhod.
//!
//! All providers implement the `naruhod_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use naruhod_config::AppConfig;
use naruhod_core::ProviderError;

/// Build the provider described by the configuration.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<OpenAiCompatProvider, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ProviderError::NotConfigured("no API key set".into()))?;

    OpenAiCompatProvider::new(provider_name(&config.api_url), &config.api_url, api_key)
}

/// Guess a display name from the endpoint URL.
fn provider_name(api_url: &str) -> &'static str {
    if api_url.contains("openrouter.ai") {
        "openrouter"
    } else if api_url.contains("localhost:11434") {
        "ollama"
    } else if api_url.contains("api.openai.com") {
        "openai"
    } else {
        "custom"
    }
}
