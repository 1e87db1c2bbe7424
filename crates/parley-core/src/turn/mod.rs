//! Turn orchestration: one human message in, one persona reply out.

pub mod lock;
pub mod orchestrator;

pub use lock::ConversationLocks;
pub use orchestrator::{TurnOrchestrator, TurnOutcome, TurnRequest, TurnSettings};
