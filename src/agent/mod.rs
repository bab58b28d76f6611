//! Agent module: routing, specialist responders, the orchestration loop,
//! and REPL command parsing.

pub mod command;
pub mod orchestrator;
pub mod responder;
pub mod router;
pub mod state;

pub use command::{Command, CommandParser};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RunOutcome, TerminationReason};
pub use responder::{CatalogResponder, Responder, ResponderRegistry};
pub use router::{ResponderKind, Router, RoutingDecision};
pub use state::{ConversationState, MessageRole};
