//! Action dispatcher: one handler per action tag.
//!
//! Non-output actions write into the turn's [`TurnContext`]; result-producing
//! actions return an [`ActionResult`]. Terminal actions are the turn loop's
//! business and pass through untouched.

use chrono::Utc;
use naruhod_core::event::{DomainEvent, EventBus};
use naruhod_core::{
    Action, ActionEnvelope, ActionError, ActionResult, ActionSchema, ActivityLogPolicy,
    CommandExecutor, TurnContext,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Routes typed actions to their handlers.
pub struct ActionDispatcher {
    /// Runs `executeCommand`
    executor: Arc<dyn CommandExecutor>,

    /// The one action set accepted this run
    schema: ActionSchema,

    /// How `recordActivityLog` entries are kept
    activity_log: ActivityLogPolicy,

    /// Event bus for domain events
    event_bus: Arc<EventBus>,
}

impl ActionDispatcher {
    /// Create a dispatcher with the canonical schema and accumulating log.
    pub fn new(executor: Arc<dyn CommandExecutor>, event_bus: Arc<EventBus>) -> Self {
        Self {
            executor,
            schema: ActionSchema::default(),
            activity_log: ActivityLogPolicy::default(),
            event_bus,
        }
    }

    /// Select the action schema.
    pub fn with_schema(mut self, schema: ActionSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Select the activity-log policy.
    pub fn with_activity_log(mut self, policy: ActivityLogPolicy) -> Self {
        self.activity_log = policy;
        self
    }

    pub fn schema(&self) -> ActionSchema {
        self.schema
    }

    pub fn activity_log_policy(&self) -> ActivityLogPolicy {
        self.activity_log
    }

    /// Decode an envelope against the active schema.
    pub fn decode(&self, envelope: &ActionEnvelope) -> Result<Action, ActionError> {
        self.schema.decode(envelope)
    }

    /// Decode then dispatch a single envelope.
    pub async fn dispatch_envelope(
        &self,
        envelope: &ActionEnvelope,
        ctx: &mut TurnContext,
    ) -> Result<Option<ActionResult>, ActionError> {
        let action = self.decode(envelope)?;
        self.dispatch(&action, ctx).await
    }

    /// Perform one action.
    ///
    /// Returns the action's result, if it produces one. Command failures are
    /// results, not errors; the only errors are actions outside the schema.
    pub async fn dispatch(
        &self,
        action: &Action,
        ctx: &mut TurnContext,
    ) -> Result<Option<ActionResult>, ActionError> {
        let kind = action.kind();
        if !self.schema.accepts(kind) {
            return Err(ActionError::UnknownActionType(kind.tag().into()));
        }

        debug!(action = %kind, "Dispatching action");
        self.event_bus.publish(DomainEvent::ActionDispatched {
            action: kind.tag().into(),
            timestamp: Utc::now(),
        });

        let result = match action {
            Action::SetMemory { memory } => {
                ctx.memory = Some(memory.clone());
                None
            }
            Action::RecordActivityLog(entry) => {
                self.activity_log
                    .apply(&mut ctx.activity_log, [entry.clone()]);
                None
            }
            Action::SetHandOverMemo { memo } => {
                ctx.hand_over_memo = Some(memo.clone());
                None
            }
            Action::ExecuteCommand(options) => {
                info!(
                    command = %options.command,
                    reason = options.reason.as_deref().unwrap_or(""),
                    "Executing command"
                );
                let start = Instant::now();
                let outcome = self.executor.execute(&options.command).await;
                let duration_ms = start.elapsed().as_millis() as u64;

                if !outcome.success {
                    warn!(command = %options.command, "Command reported an error");
                }
                self.event_bus.publish(DomainEvent::CommandExecuted {
                    command: options.command.clone(),
                    success: outcome.success,
                    duration_ms,
                    timestamp: Utc::now(),
                });

                Some(ActionResult::ExecuteCommand {
                    options: options.clone(),
                    output: outcome.output,
                    error: outcome.error,
                })
            }
            Action::ReadNextNumber => {
                let number = rand::rng().random_range(1..=10);
                debug!(number, "Read next number");
                Some(ActionResult::ReadNextNumber { number })
            }
            Action::TaskDone { .. } | Action::TaskRejected { .. } => None,
        };

        Ok(result)
    }
}
