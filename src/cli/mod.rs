use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod flags;
pub use flags::{GenerateFlags, OutputFlags};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration files
    Validate,

    /// Show effective configuration after merging all sources
    Show,
}

#[derive(Parser, Debug)]
#[command(name = "specpilot")]
#[command(about = "Generate clarifying questions and implementation plans for feature specs with AI CLIs", long_about = None)]
#[command(version)]
#[command(after_help = "\
EXAMPLES:
  specpilot agents                        List detected agent CLIs
  specpilot analyze                       Show what specpilot knows about this project
  specpilot questions specs/login.md      Append clarifying questions to a spec
  specpilot plan specs/login.md --important src/auth.ts
                                          Append an implementation plan
  specpilot plan specs/login.md --dry-run Print the agent command only

For details about a specific command, use:
  specpilot <command> --help")]
pub struct Cli {
    /// Workspace root (defaults to the enclosing git repository or the current directory)
    #[arg(long, global = true, env = "SPECPILOT_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Report every agent as installed and logged in without probing
    #[arg(long, global = true)]
    pub mock_agents: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect agent CLIs and show which one is selected
    Agents(OutputFlags),

    /// Analyze the workspace and print the project summary
    Analyze(OutputFlags),

    /// Append clarifying questions to a feature spec
    #[command(alias = "q")]
    Questions(GenerateFlags),

    /// Append an implementation plan to a feature spec
    #[command(alias = "p")]
    Plan(GenerateFlags),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan_flags() {
        let cli = Cli::parse_from([
            "specpilot",
            "-vv",
            "plan",
            "specs/a.md",
            "--important",
            "src/a.ts",
            "--important",
            "src/b.ts",
            "--agent",
            "cloudai",
            "--dry-run",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Plan(flags) => {
                assert_eq!(flags.spec_file, PathBuf::from("specs/a.md"));
                assert_eq!(flags.important_files.len(), 2);
                assert_eq!(flags.agent.as_deref(), Some("cloudai"));
                assert!(flags.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dry_run_conflicts_with_terminal() {
        let result = Cli::try_parse_from(["specpilot", "questions", "a.md", "--dry-run", "--terminal"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["specpilot", "agents", "--json", "--mock-agents"]);
        assert!(cli.mock_agents);
        assert!(matches!(cli.command, Commands::Agents(OutputFlags { json: true })));
    }
}
