//! The action vocabulary spoken between the model and the agent.
//!
//! The model replies with an [`Instruction`]: a JSON object holding an
//! ordered list of [`ActionEnvelope`]s (`{ "type", "options"?, "reason"? }`).
//! Envelopes are decoded against exactly one [`ActionSchema`] into the
//! closed [`Action`] enum before anything is executed.
//!
//! Two schema generations exist:
//!
//! | Tag                 | V1 (deprecated) | V2 (canonical) |
//! |---------------------|:---------------:|:--------------:|
//! | `setMemory`         | ✓ | ✓ |
//! | `recordActivityLog` |   | ✓ |
//! | `executeCommand`    | ✓ | ✓ |
//! | `taskDone`          | ✓ | ✓ |
//! | `taskRejected`      | ✓ | ✓ |
//! | `setHandOverMemo`   | ✓ |   |
//! | `readNextNumber`    | ✓ |   |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ActivityLogEntry;
use crate::error::ActionError;

/// Every tag any schema generation knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    SetMemory,
    RecordActivityLog,
    ExecuteCommand,
    TaskDone,
    TaskRejected,
    SetHandOverMemo,
    ReadNextNumber,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::SetMemory,
        ActionKind::RecordActivityLog,
        ActionKind::ExecuteCommand,
        ActionKind::TaskDone,
        ActionKind::TaskRejected,
        ActionKind::SetHandOverMemo,
        ActionKind::ReadNextNumber,
    ];

    /// The wire tag (`"type"` field) for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::SetMemory => "setMemory",
            ActionKind::RecordActivityLog => "recordActivityLog",
            ActionKind::ExecuteCommand => "executeCommand",
            ActionKind::TaskDone => "taskDone",
            ActionKind::TaskRejected => "taskRejected",
            ActionKind::SetHandOverMemo => "setHandOverMemo",
            ActionKind::ReadNextNumber => "readNextNumber",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// Terminal kinds end the whole conversation.
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionKind::TaskDone | ActionKind::TaskRejected)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Which generation of the action set is active for a run.
///
/// Only one schema is ever active; a tag outside it is unknown even if the
/// other generation defines it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSchema {
    /// Deprecated: hand-over memo and the number-reading demo action.
    V1,
    /// Canonical: memory plus structured activity log.
    #[default]
    V2,
}

const V1_KINDS: &[ActionKind] = &[
    ActionKind::SetHandOverMemo,
    ActionKind::SetMemory,
    ActionKind::ReadNextNumber,
    ActionKind::ExecuteCommand,
    ActionKind::TaskDone,
    ActionKind::TaskRejected,
];

const V2_KINDS: &[ActionKind] = &[
    ActionKind::SetMemory,
    ActionKind::RecordActivityLog,
    ActionKind::ExecuteCommand,
    ActionKind::TaskDone,
    ActionKind::TaskRejected,
];

impl ActionSchema {
    pub fn version(self) -> u32 {
        match self {
            ActionSchema::V1 => 1,
            ActionSchema::V2 => 2,
        }
    }

    /// The kinds this schema accepts, in the order they are presented to the model.
    pub fn kinds(self) -> &'static [ActionKind] {
        match self {
            ActionSchema::V1 => V1_KINDS,
            ActionSchema::V2 => V2_KINDS,
        }
    }

    pub fn accepts(self, kind: ActionKind) -> bool {
        self.kinds().contains(&kind)
    }

    /// Decode one envelope into a typed action.
    pub fn decode(self, envelope: &ActionEnvelope) -> Result<Action, ActionError> {
        let kind = ActionKind::from_tag(&envelope.kind)
            .filter(|k| self.accepts(*k))
            .ok_or_else(|| ActionError::UnknownActionType(envelope.kind.clone()))?;

        let action = match kind {
            ActionKind::SetMemory => {
                let opts: SetMemoryOptions = decode_options(envelope, kind)?;
                Action::SetMemory { memory: opts.memory }
            }
            ActionKind::RecordActivityLog => {
                Action::RecordActivityLog(decode_options(envelope, kind)?)
            }
            ActionKind::ExecuteCommand => {
                let mut opts: ExecuteCommandOptions = decode_options(envelope, kind)?;
                if opts.reason.is_none() {
                    opts.reason = envelope.reason.clone();
                }
                Action::ExecuteCommand(opts)
            }
            ActionKind::TaskDone => Action::TaskDone {
                report: option_str(envelope, "report")
                    .or_else(|| envelope.reason.clone())
                    .unwrap_or_default(),
            },
            ActionKind::TaskRejected => Action::TaskRejected {
                reason: envelope
                    .reason
                    .clone()
                    .or_else(|| option_str(envelope, "reason"))
                    .unwrap_or_default(),
            },
            ActionKind::SetHandOverMemo => {
                let opts: SetHandOverMemoOptions = decode_options(envelope, kind)?;
                Action::SetHandOverMemo { memo: opts.memo }
            }
            ActionKind::ReadNextNumber => Action::ReadNextNumber,
        };

        Ok(action)
    }

    /// Decode an action list up to and including the first terminal action.
    ///
    /// Envelopes after a terminal action are never read. Everything before
    /// it must decode, so the list is either typed or rejected as a unit.
    pub fn decode_until_terminal(
        self,
        envelopes: &[ActionEnvelope],
    ) -> Result<Vec<Action>, ActionError> {
        let mut actions = Vec::with_capacity(envelopes.len());
        for envelope in envelopes {
            let action = self.decode(envelope)?;
            let terminal = action.is_terminal();
            actions.push(action);
            if terminal {
                break;
            }
        }
        Ok(actions)
    }
}

fn decode_options<T: DeserializeOwned>(
    envelope: &ActionEnvelope,
    kind: ActionKind,
) -> Result<T, ActionError> {
    let value = envelope.options.clone().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| ActionError::InvalidOptions {
        action: kind.tag().into(),
        reason: e.to_string(),
    })
}

fn option_str(envelope: &ActionEnvelope, key: &str) -> Option<String> {
    envelope
        .options
        .as_ref()
        .and_then(|o| o.get(key))
        .and_then(Value::as_str)
        .map(String::from)
}

/// The wire form of one action, as the model writes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    /// The action tag (`"type"` on the wire)
    #[serde(rename = "type")]
    pub kind: String,

    /// Tag-specific options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    /// The model's stated reason for the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ActionEnvelope {
    pub fn new(kind: impl Into<String>, options: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            options,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// The model's reply: an ordered list of actions to perform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub actions: Vec<ActionEnvelope>,
}

impl Instruction {
    /// Parse the raw text of a model reply.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[derive(Debug, Deserialize)]
struct SetMemoryOptions {
    #[serde(default)]
    memory: Value,
}

#[derive(Debug, Deserialize)]
struct SetHandOverMemoOptions {
    memo: String,
}

/// Options of an `executeCommand` action. Echoed back in its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCommandOptions {
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ExecuteCommandOptions {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            reason: None,
        }
    }
}

/// A typed action. Exactly one variant is active per value.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the turn's memory blob.
    SetMemory { memory: Value },
    /// Record a narrative activity-log entry.
    RecordActivityLog(ActivityLogEntry),
    /// Run a shell command and report its output.
    ExecuteCommand(ExecuteCommandOptions),
    /// Terminal: the task is complete.
    TaskDone { report: String },
    /// Terminal: the model refuses or cannot do the task.
    TaskRejected { reason: String },
    /// V1 only. Replace the turn's hand-over memo.
    SetHandOverMemo { memo: String },
    /// V1 only. Produce a random number in `1..=10`.
    ReadNextNumber,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::SetMemory { .. } => ActionKind::SetMemory,
            Action::RecordActivityLog(_) => ActionKind::RecordActivityLog,
            Action::ExecuteCommand(_) => ActionKind::ExecuteCommand,
            Action::TaskDone { .. } => ActionKind::TaskDone,
            Action::TaskRejected { .. } => ActionKind::TaskRejected,
            Action::SetHandOverMemo { .. } => ActionKind::SetHandOverMemo,
            Action::ReadNextNumber => ActionKind::ReadNextNumber,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    pub fn execute_command(command: impl Into<String>) -> Self {
        Action::ExecuteCommand(ExecuteCommandOptions::new(command))
    }
}

impl From<&Action> for ActionEnvelope {
    fn from(action: &Action) -> Self {
        let kind = action.kind().tag();
        match action {
            Action::SetMemory { memory } => {
                ActionEnvelope::new(kind, Some(serde_json::json!({ "memory": memory })))
            }
            Action::RecordActivityLog(entry) => {
                ActionEnvelope::new(kind, serde_json::to_value(entry).ok())
            }
            Action::ExecuteCommand(opts) => {
                ActionEnvelope::new(kind, serde_json::to_value(opts).ok())
            }
            Action::TaskDone { report } => {
                ActionEnvelope::new(kind, Some(serde_json::json!({ "report": report })))
            }
            Action::TaskRejected { reason } => ActionEnvelope::new(kind, None).with_reason(reason),
            Action::SetHandOverMemo { memo } => {
                ActionEnvelope::new(kind, Some(serde_json::json!({ "memo": memo })))
            }
            Action::ReadNextNumber => ActionEnvelope::new(kind, None),
        }
    }
}

/// The outcome of a result-producing action, reported to the model next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActionResult {
    ExecuteCommand {
        options: ExecuteCommandOptions,
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ReadNextNumber {
        number: u32,
    },
}
