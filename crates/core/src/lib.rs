//! # naruhod core
//!
//! Domain types, traits, and error definitions for the naruhod agent loop.
//! This crate has **no framework dependencies**: it defines the action
//! vocabulary, the turn/global context model and the seams (`Provider`,
//! `CommandExecutor`) that the other crates implement against.
//!
//! ## Layout
//!
//! - [`action`]: the closed, version-stamped action set the model speaks
//! - [`context`]: per-turn and per-invocation context
//! - [`executor`]: the command execution seam
//! - [`provider`] / [`message`]: the LLM backend seam
//! - [`event`]: the observability hook (domain events on a broadcast bus)

pub mod action;
pub mod context;
pub mod error;
pub mod event;
pub mod executor;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use action::{
    Action, ActionEnvelope, ActionKind, ActionResult, ActionSchema, ExecuteCommandOptions,
    Instruction,
};
pub use context::{ActivityLogEntry, ActivityLogPolicy, GlobalContext, TurnContext};
pub use error::{ActionError, Error, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use executor::{CommandExecutor, CommandOutput};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
