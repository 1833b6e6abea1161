//! Building agent command lines.

pub mod builder;
pub mod shell;
pub mod validate;

pub use builder::{CommandBuilder, DEFAULT_MAX_COMMAND_CHARS};
pub use shell::ShellFlavor;
pub use validate::{validate_command, Validation};
