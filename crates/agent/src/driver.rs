//! Conversation driver: kickoff, then turns until the model ends the task.
//!
//! The driver owns the loop. The [`Replier`] is the turn's result sink: it
//! folds the finished turn into the conversation history, builds the next
//! prompt, sends it and holds the reply until the driver takes it.

use async_trait::async_trait;
use chrono::Utc;
use naruhod_core::event::{DomainEvent, EventBus};
use naruhod_core::{
    ActionResult, ActivityLogEntry, ActivityLogPolicy, Error, GlobalContext, Instruction, Result,
    TurnContext,
};
use std::sync::Arc;
use tracing::{Instrument, info, info_span};

use crate::gateway::ModelGateway;
use crate::prompt::PromptFactory;
use crate::turn::{ResultSink, TurnOutcome, TurnRunner};

/// How a conversation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationOutcome {
    Done { report: String, turns: u32 },
    Rejected { reason: String, turns: u32 },
}

impl ConversationOutcome {
    pub fn turns(&self) -> u32 {
        match self {
            ConversationOutcome::Done { turns, .. } | ConversationOutcome::Rejected { turns, .. } => {
                *turns
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ConversationOutcome::Done { .. } => "done",
            ConversationOutcome::Rejected { .. } => "rejected",
        }
    }
}

/// Sends each turn's outcome back to the model.
pub struct Replier {
    gateway: Arc<dyn ModelGateway>,
    prompts: PromptFactory,
    policy: ActivityLogPolicy,
    history: Vec<ActivityLogEntry>,
    pending: Option<Instruction>,
}

impl Replier {
    pub fn new(gateway: Arc<dyn ModelGateway>, prompts: PromptFactory, policy: ActivityLogPolicy) -> Self {
        Self {
            gateway,
            prompts,
            policy,
            history: Vec::new(),
            pending: None,
        }
    }

    /// Send the unsolicited first request.
    pub async fn kickoff(&mut self, global: &GlobalContext) -> Result<()> {
        let prompt = self.prompts.kickoff(global);
        self.pending = Some(self.gateway.send(&prompt).await?);
        Ok(())
    }

    /// The instruction received for the next turn, if any.
    pub fn take_instruction(&mut self) -> Option<Instruction> {
        self.pending.take()
    }

    /// Activity-log history carried in every prompt.
    pub fn activity_log(&self) -> &[ActivityLogEntry] {
        &self.history
    }
}

#[async_trait]
impl ResultSink for Replier {
    async fn send_reply(
        &mut self,
        global: &GlobalContext,
        context: TurnContext,
        results: Vec<ActionResult>,
    ) -> Result<()> {
        self.policy
            .apply(&mut self.history, context.activity_log.iter().cloned());
        let prompt = self
            .prompts
            .create(global, context, self.history.clone(), results);
        self.pending = Some(self.gateway.send(&prompt).await?);
        Ok(())
    }
}

/// Drives one task from kickoff to a terminal action.
pub struct ConversationDriver {
    runner: TurnRunner,
    gateway: Arc<dyn ModelGateway>,
    prompts: PromptFactory,
    event_bus: Arc<EventBus>,
}

impl ConversationDriver {
    pub fn new(
        runner: TurnRunner,
        gateway: Arc<dyn ModelGateway>,
        prompts: PromptFactory,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            runner,
            gateway,
            prompts,
            event_bus,
        }
    }

    /// Run `task_description` until the model finishes or rejects it.
    ///
    /// There is no turn limit; any error from a turn ends the conversation.
    pub async fn start(&self, task_description: &str) -> Result<ConversationOutcome> {
        let global = GlobalContext::new(task_description);
        let mut replier = Replier::new(
            self.gateway.clone(),
            self.prompts.clone(),
            self.runner.dispatcher().activity_log_policy(),
        );

        info!(
            schema = self.runner.dispatcher().schema().version(),
            "Starting conversation"
        );
        replier.kickoff(&global).await?;

        let mut turn: u32 = 0;
        let outcome = loop {
            turn += 1;
            let instruction = replier
                .take_instruction()
                .ok_or_else(|| Error::Internal("no instruction pending for the next turn".into()))?;

            let result = self
                .runner
                .run(&global, &instruction, &mut replier)
                .instrument(info_span!("turn", turn))
                .await?;

            match result {
                TurnOutcome::Continue { results } => {
                    self.event_bus.publish(DomainEvent::TurnCompleted {
                        turn,
                        results,
                        timestamp: Utc::now(),
                    });
                }
                TurnOutcome::Done { report } => {
                    break ConversationOutcome::Done { report, turns: turn };
                }
                TurnOutcome::Rejected { reason } => {
                    break ConversationOutcome::Rejected { reason, turns: turn };
                }
            }
        };

        info!(outcome = outcome.label(), turns = turn, "Conversation finished");
        self.event_bus.publish(DomainEvent::ConversationFinished {
            outcome: outcome.label().into(),
            turns: turn,
            timestamp: Utc::now(),
        });
        Ok(outcome)
    }
}
