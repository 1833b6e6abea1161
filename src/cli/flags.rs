use clap::Parser;
use std::path::PathBuf;

/// Flags shared by the generating commands (`questions`, `plan`).
#[derive(Parser, Debug, Clone, Default)]
pub struct GenerateFlags {
    /// Feature spec file, relative to the workspace root
    pub spec_file: PathBuf,

    /// Agent to use instead of the auto-selected one
    #[arg(long)]
    pub agent: Option<String>,

    /// File to analyze and include in the prompt (repeatable)
    #[arg(long = "important")]
    pub important_files: Vec<PathBuf>,

    /// Notes about the existing implementation to include in the prompt
    #[arg(long = "context")]
    pub implementation_context: Option<String>,

    /// File whose content is included in the prompt
    #[arg(long = "context-file")]
    pub context_file: Option<PathBuf>,

    /// Execution timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the command without running it
    #[arg(long, conflicts_with = "terminal")]
    pub dry_run: bool,

    /// Run the command in an interactive shell session instead of capturing it
    #[arg(long)]
    pub terminal: bool,
}

/// Output format flag for the reporting commands.
#[derive(Parser, Debug, Clone, Default)]
pub struct OutputFlags {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}
