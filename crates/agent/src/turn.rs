//! The turn loop: execute one instruction's action list.
//!
//! A turn starts with an empty [`TurnContext`] and result list, runs every
//! action in order, and either stops at the first terminal action or hands
//! the context and results to a [`ResultSink`] exactly once.

use async_trait::async_trait;
use naruhod_core::{Action, ActionResult, GlobalContext, Instruction, Result, TurnContext};
use tracing::{debug, info};

use crate::dispatcher::ActionDispatcher;

/// Where a finished non-terminal turn reports to.
#[async_trait]
pub trait ResultSink: Send {
    /// Deliver the turn's context and results. Called once per non-terminal turn.
    async fn send_reply(
        &mut self,
        global: &GlobalContext,
        context: TurnContext,
        results: Vec<ActionResult>,
    ) -> Result<()>;
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The sink was called; the conversation goes on.
    Continue { results: usize },
    /// `taskDone` was reached.
    Done { report: String },
    /// `taskRejected` was reached.
    Rejected { reason: String },
}

impl TurnOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnOutcome::Continue { .. })
    }
}

/// Runs action lists through a dispatcher.
pub struct TurnRunner {
    dispatcher: ActionDispatcher,
}

impl TurnRunner {
    pub fn new(dispatcher: ActionDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Decode an instruction against the active schema, then run it.
    ///
    /// Nothing executes unless every action up to the first terminal one
    /// decodes. Anything after a terminal action is ignored.
    pub async fn run(
        &self,
        global: &GlobalContext,
        instruction: &Instruction,
        sink: &mut dyn ResultSink,
    ) -> Result<TurnOutcome> {
        let actions = self
            .dispatcher
            .schema()
            .decode_until_terminal(&instruction.actions)?;
        self.run_actions(global, &actions, sink).await
    }

    /// Run already-typed actions in order.
    pub async fn run_actions(
        &self,
        global: &GlobalContext,
        actions: &[Action],
        sink: &mut dyn ResultSink,
    ) -> Result<TurnOutcome> {
        let mut context = TurnContext::new();
        let mut results = Vec::new();

        for action in actions {
            match action {
                Action::TaskDone { report } => {
                    info!(report = %report, "Task done");
                    return Ok(TurnOutcome::Done {
                        report: report.clone(),
                    });
                }
                Action::TaskRejected { reason } => {
                    info!(reason = %reason, "Task rejected");
                    return Ok(TurnOutcome::Rejected {
                        reason: reason.clone(),
                    });
                }
                _ => {
                    if let Some(result) = self.dispatcher.dispatch(action, &mut context).await? {
                        results.push(result);
                    }
                }
            }
        }

        let count = results.len();
        debug!(results = count, "Turn finished without a terminal action");
        sink.send_reply(global, context, results).await?;
        Ok(TurnOutcome::Continue { results: count })
    }
}
