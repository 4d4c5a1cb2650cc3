//! Agent core: tool dispatch, intent extraction, and the turn loop.

use thiserror::Error;

pub mod confirm;
pub mod extract;
pub mod tools;
pub mod turn;

pub use confirm::{AutoApprove, AutoDeny, Confirmation, ConfirmationProvider, ConsoleConfirmation, NoChannel};
pub use tools::{ToolRegistry, ToolTrait};
pub use turn::{AgentLoop, AgentSettings};

/// Agent loop errors. Tool-level failures never surface here; they are
/// converted to textual tool results at the dispatch boundary.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("too many tool calls")]
    MaxRounds,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
