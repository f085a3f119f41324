//! Shared test doubles for the agent loop.

use async_trait::async_trait;
use naruhod_core::error::ProviderError;
use naruhod_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use naruhod_core::{
    ActionResult, CommandExecutor, CommandOutput, Error, GlobalContext, Instruction, Message,
    Result, TurnContext,
};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::gateway::ModelGateway;
use crate::prompt::Prompt;
use crate::turn::ResultSink;

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the request. Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    responses: Mutex<VecDeque<std::result::Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<std::result::Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script a sequence of raw reply bodies.
    pub fn replies(bodies: &[&str]) -> Self {
        Self::new(bodies.iter().map(|b| Ok(make_text_response(b))).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("SequentialMockProvider: no more responses")
    }
}

/// Create a plain assistant reply.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Records every command. Answers `echo X` with `X` and `warn X` with `X` on stderr only.
#[derive(Default)]
pub struct RecordingExecutor {
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    fn name(&self) -> &str {
        "recording"
    }

    async fn execute(&self, command: &str) -> CommandOutput {
        self.commands.lock().unwrap().push(command.to_string());
        if let Some(text) = command.strip_prefix("echo ") {
            return CommandOutput::success(text);
        }
        if let Some(text) = command.strip_prefix("warn ") {
            return CommandOutput::success("").with_diagnostic(text);
        }
        CommandOutput::failure(format!("{command}: not found"))
    }
}

/// One recorded `send_reply` call.
#[derive(Debug, Clone)]
pub struct Reply {
    pub global: GlobalContext,
    pub context: TurnContext,
    pub results: Vec<ActionResult>,
}

/// A result sink that only records what it was given.
#[derive(Default)]
pub struct RecordingSink {
    pub replies: Vec<Reply>,
    pub fail: bool,
}

#[async_trait]
impl ResultSink for RecordingSink {
    async fn send_reply(
        &mut self,
        global: &GlobalContext,
        context: TurnContext,
        results: Vec<ActionResult>,
    ) -> Result<()> {
        if self.fail {
            return Err(Error::Internal("sink unavailable".into()));
        }
        self.replies.push(Reply {
            global: global.clone(),
            context,
            results,
        });
        Ok(())
    }
}

/// A gateway that hands out scripted instructions and keeps every prompt.
pub struct ScriptedGateway {
    instructions: Mutex<VecDeque<Instruction>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedGateway {
    /// Script replies as JSON bodies, parsed up front.
    pub fn new(bodies: &[&str]) -> Self {
        Self {
            instructions: Mutex::new(
                bodies
                    .iter()
                    .map(|b| Instruction::parse(b).unwrap())
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn send(&self, prompt: &Prompt) -> Result<Instruction> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.instructions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Internal("script exhausted".into()))
    }
}
