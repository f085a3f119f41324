//! Turn and invocation context.
//!
//! A [`GlobalContext`] lives for one CLI invocation and never changes.
//! A [`TurnContext`] is created empty at the start of every turn, filled
//! in by the non-output actions, folded into the next request, then dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Invocation-wide context, immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalContext {
    pub task_description: String,

    /// Reserved; always empty.
    #[serde(default)]
    pub sub_tasks: Vec<String>,
}

impl GlobalContext {
    pub fn new(task_description: impl Into<String>) -> Self {
        Self {
            task_description: task_description.into(),
            sub_tasks: Vec::new(),
        }
    }
}

/// One structured activity-log record written by the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityLogEntry {
    /// The model's current picture of the whole task
    pub assumed_whole_task_flow: String,

    /// What was done during this turn
    pub this_time_activity_log: String,

    /// What the model expects to do next
    pub assumed_next_action: String,
}

/// How `recordActivityLog` entries are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLogPolicy {
    /// Each entry replaces the previous one; only the latest survives.
    Overwrite,
    /// Entries are appended and kept for the whole invocation.
    #[default]
    Accumulate,
}

impl ActivityLogPolicy {
    /// Fold `entries` into `log` according to the policy.
    pub fn apply(self, log: &mut Vec<ActivityLogEntry>, entries: impl IntoIterator<Item = ActivityLogEntry>) {
        match self {
            ActivityLogPolicy::Overwrite => {
                if let Some(last) = entries.into_iter().last() {
                    log.clear();
                    log.push(last);
                }
            }
            ActivityLogPolicy::Accumulate => log.extend(entries),
        }
    }
}

/// State written by the actions of a single turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnContext {
    /// Free-form memory blob; last write wins.
    #[serde(default)]
    pub memory: Option<Value>,

    /// Hand-over memo (V1 schema only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_over_memo: Option<String>,

    /// Activity-log entries recorded this turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activity_log: Vec<ActivityLogEntry>,
}

impl TurnContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_none() && self.hand_over_memo.is_none() && self.activity_log.is_empty()
    }
}
