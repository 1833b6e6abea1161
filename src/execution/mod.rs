//! Running built commands, either captured or in an interactive shell.

pub mod service;
pub mod terminal;

pub use service::{CommandExecutionResult, ExecutionOptions, ExecutionService, DEFAULT_TIMEOUT};
pub use terminal::TerminalSessions;
