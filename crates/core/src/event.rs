//! Domain event system: the observability hook of the agent loop.
//!
//! Components publish events as the conversation progresses (requests,
//! instructions, dispatched actions, executed commands, turn and
//! conversation ends). Anything interested subscribes to the bus instead of
//! reaching for process-wide counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A request was sent to the model
    RequestSent {
        model: String,
        prompt_chars: usize,
        timestamp: DateTime<Utc>,
    },

    /// A new instruction list arrived from the model
    InstructionReceived {
        action_count: usize,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// An action was handed to the dispatcher
    ActionDispatched {
        action: String,
        timestamp: DateTime<Utc>,
    },

    /// A command finished (successfully or not)
    CommandExecuted {
        command: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A turn ran through without a terminal action
    TurnCompleted {
        turn: u32,
        results: usize,
        timestamp: DateTime<Utc>,
    },

    /// The model ended the conversation
    ConversationFinished {
        outcome: String,
        turns: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
