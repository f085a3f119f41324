//! The naruhod agent loop.
//!
//! The model never talks to the host directly. It replies with an ordered
//! list of actions, and the agent:
//!
//! 1. **Decodes** the whole list against the active action schema
//! 2. **Dispatches** actions one by one ([`ActionDispatcher`])
//! 3. **Stops** at the first `taskDone` / `taskRejected`
//! 4. **Replies** with the turn's context and results ([`ResultSink`])
//! 5. **Receives** the next list from the model ([`ModelGateway`]) and loops
//!
//! The conversation ends only when the model ends it, or when an error
//! propagates out of a turn.

pub mod dispatcher;
pub mod driver;
pub mod gateway;
pub mod prompt;
pub mod turn;
pub mod workspace;

#[cfg(test)]
mod test_helpers;

pub use dispatcher::ActionDispatcher;
pub use driver::{ConversationDriver, ConversationOutcome, Replier};
pub use gateway::{ModelGateway, ProviderGateway};
pub use prompt::{Prompt, PromptFactory};
pub use turn::{ResultSink, TurnOutcome, TurnRunner};
pub use workspace::{render_directory, scan_directory};
