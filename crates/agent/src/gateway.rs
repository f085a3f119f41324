//! Model gateway: send a prompt, get back the next instruction.

use async_trait::async_trait;
use chrono::Utc;
use naruhod_config::AppConfig;
use naruhod_core::event::{DomainEvent, EventBus};
use naruhod_core::{Error, Instruction, Message, Provider, ProviderRequest, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::prompt::Prompt;

/// The external collaborator that turns a prompt into an instruction.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn send(&self, prompt: &Prompt) -> Result<Instruction>;
}

/// A gateway over any chat-completions [`Provider`].
pub struct ProviderGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    json_mode: bool,
    event_bus: Arc<EventBus>,
}

impl ProviderGateway {
    /// Create a gateway with temperature 0 and JSON mode on.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, event_bus: Arc<EventBus>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            json_mode: true,
            event_bus,
        }
    }

    /// Create a gateway with the model settings from `config`.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig, event_bus: Arc<EventBus>) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            json_mode: config.json_mode,
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }
}

#[async_trait]
impl ModelGateway for ProviderGateway {
    async fn send(&self, prompt: &Prompt) -> Result<Instruction> {
        let state = prompt.render();
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(prompt.rules()), Message::user(state.as_str())],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_response: self.json_mode,
        };

        debug!(
            provider = self.provider.name(),
            payload = %serde_json::to_string_pretty(prompt).unwrap_or_default(),
            "Sending prompt"
        );
        self.event_bus.publish(DomainEvent::RequestSent {
            model: self.model.clone(),
            prompt_chars: state.len(),
            timestamp: Utc::now(),
        });

        let response = self.provider.complete(request).await?;
        let content = response.message.content;

        let instruction = Instruction::parse(&content).map_err(|e| Error::InvalidInstruction {
            reason: e.to_string(),
            content: content.clone(),
        })?;

        debug!(
            instruction = %serde_json::to_string_pretty(&instruction).unwrap_or_default(),
            "Received instruction"
        );
        info!(
            actions = instruction.actions.len(),
            model = %response.model,
            "Instruction received"
        );
        self.event_bus.publish(DomainEvent::InstructionReceived {
            action_count: instruction.actions.len(),
            tokens_used: response.usage.map(|u| u.total_tokens),
            timestamp: Utc::now(),
        });

        Ok(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptFactory;
    use crate::test_helpers::SequentialMockProvider;
    use naruhod_core::error::ProviderError;
    use naruhod_core::{ActionSchema, GlobalContext, Role};

    fn prompt() -> Prompt {
        PromptFactory::new("{}", ActionSchema::V2).kickoff(&GlobalContext::new("greet"))
    }

    #[tokio::test]
    async fn sends_rules_and_state_then_parses() {
        let provider = Arc::new(SequentialMockProvider::replies(&[
            r#"{"actions":[{"type":"taskDone","options":{"report":"hi"}}]}"#,
        ]));
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let gateway = ProviderGateway::new(provider.clone(), "gpt-4-turbo", bus);

        let instruction = gateway.send(&prompt()).await.unwrap();
        assert_eq!(instruction.actions.len(), 1);
        assert_eq!(instruction.actions[0].kind, "taskDone");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "gpt-4-turbo");
        assert_eq!(request.temperature, 0.0);
        assert!(request.json_response);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Global Rule"));
        assert_eq!(request.messages[1].role, Role::User);
        assert!(request.messages[1].content.contains(r#"taskDescription: "greet""#));

        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            DomainEvent::RequestSent { .. }
        ));
        match rx.recv().await.unwrap().as_ref() {
            DomainEvent::InstructionReceived { action_count, tokens_used, .. } => {
                assert_eq!(*action_count, 1);
                assert_eq!(*tokens_used, Some(15));
            }
            other => panic!("Expected InstructionReceived, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn settings_come_from_config() {
        let provider = Arc::new(SequentialMockProvider::replies(&[r#"{"actions":[]}"#]));
        let mut config = AppConfig::default();
        config.model = "gpt-4o-mini".into();
        config.temperature = 0.7;
        config.max_tokens = Some(256);
        config.json_mode = false;
        let gateway =
            ProviderGateway::from_config(provider.clone(), &config, Arc::new(EventBus::default()));

        gateway.send(&prompt()).await.unwrap();

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.7);
        assert_eq!(request.max_tokens, Some(256));
        assert!(!request.json_response);
    }

    #[tokio::test]
    async fn non_json_reply_is_invalid_instruction() {
        let provider = Arc::new(SequentialMockProvider::replies(&["Sure! Here you go."]));
        let gateway = ProviderGateway::new(provider, "m", Arc::new(EventBus::default()));

        match gateway.send(&prompt()).await {
            Err(Error::InvalidInstruction { content, .. }) => {
                assert_eq!(content, "Sure! Here you go.")
            }
            other => panic!("Expected InvalidInstruction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_without_actions_is_invalid_instruction() {
        let provider = Arc::new(SequentialMockProvider::replies(&[r#"{"steps":[]}"#]));
        let gateway = ProviderGateway::new(provider, "m", Arc::new(EventBus::default()));

        assert!(matches!(
            gateway.send(&prompt()).await,
            Err(Error::InvalidInstruction { .. })
        ));
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        let provider = Arc::new(SequentialMockProvider::new(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let gateway = ProviderGateway::new(provider, "m", Arc::new(EventBus::default()))
            .with_temperature(0.2)
            .with_max_tokens(64)
            .with_json_mode(true);

        assert!(matches!(
            gateway.send(&prompt()).await,
            Err(Error::Provider(ProviderError::AuthenticationFailed(_)))
        ));
    }
}
