#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use specpilot::cli::{Cli, Commands};
use specpilot::commands;
use specpilot::config::{CliOverrides, Config};
use specpilot::project::Workspace;
use specpilot::prompts::Operation;
use specpilot::workflow::Workflow;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,specpilot={}", level)));

    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let workspace = match &cli.workspace {
        Some(path) => Workspace::from_path(path)?,
        None => Workspace::detect()?,
    };

    // Config commands report invalid files themselves
    if let Commands::Config { command } = &cli.command {
        commands::config::execute(&workspace, command)?;
        return Ok(());
    }

    let generate_flags = match &cli.command {
        Commands::Questions(flags) | Commands::Plan(flags) => Some(flags),
        _ => None,
    };
    let overrides = CliOverrides {
        verbose: cli.verbose,
        mock_agents: cli.mock_agents,
        agent: generate_flags.and_then(|f| f.agent.clone()),
        timeout_secs: generate_flags.and_then(|f| f.timeout),
    };
    let config = Config::load(workspace.root())?.with_cli_overrides(&overrides);

    match &cli.command {
        Commands::Analyze(output) => {
            commands::analyze::execute(&workspace, &config, output.json)?;
        }
        Commands::Agents(output) => {
            let manager = commands::helpers::init_manager(&config).await?;
            commands::agents::execute(&manager, output.json)?;
        }
        Commands::Questions(flags) | Commands::Plan(flags) => {
            let operation = if matches!(cli.command, Commands::Questions(_)) {
                Operation::Questionnaire
            } else {
                Operation::ImplementationPlan
            };

            let manager = commands::helpers::init_manager(&config).await?;
            let workflow = Workflow::new(workspace.clone(), config.clone(), manager);

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            let executor = workflow.executor().clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                    executor.kill_all();
                }
            });

            let outcome = commands::generate::execute(&workflow, operation, flags, cancel).await;
            workflow.shutdown().await;
            let succeeded = outcome?;
            if !succeeded {
                std::process::exit(1);
            }
        }
        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}
