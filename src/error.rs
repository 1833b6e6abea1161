use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecPilotError {
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(PathBuf),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent '{0}' is not available. Install it and run 'specpilot agents' again.")]
    AgentUnavailable(String),

    #[error("No agent selected. Install a supported CLI or pass --agent <id>.")]
    NoAgentSelected,

    #[error("Agent '{agent}' does not support {operation}")]
    UnsupportedOperation { agent: String, operation: String },

    #[error("Command is {length} characters long, exceeding the {max} character limit. Shorten the feature spec or important files.")]
    CommandTooLong { length: usize, max: usize },

    #[error("Refusing to run command: {0}")]
    UnsafeCommand(String),

    #[error("Spec file not found: {0}")]
    SpecFileNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SpecPilotError>;
