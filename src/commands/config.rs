use crate::cli::ConfigCommands;
use crate::config::{global_config_path, project_config_path, Config};
use crate::error::Result;
use crate::project::Workspace;

pub fn execute(workspace: &Workspace, command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Validate => validate(workspace),
        ConfigCommands::Show => show(workspace),
    }
}

fn validate(workspace: &Workspace) -> Result<()> {
    let project_config = project_config_path(workspace.root());

    println!("Validating configuration files...\n");

    match global_config_path() {
        Some(global_config) if global_config.exists() => {
            println!("  Global config: {}", global_config.display());
        }
        Some(global_config) => {
            println!(
                "  Global config: {} - not found (optional)",
                global_config.display()
            );
        }
        None => println!("  Global config: HOME is not set, skipped"),
    }

    if project_config.exists() {
        println!("  Project config: {}", project_config.display());
    } else {
        println!(
            "  Project config: {} - not found (optional)",
            project_config.display()
        );
    }

    println!("\nLoading and validating configuration...");
    match Config::load(workspace.root()) {
        Ok(_) => {
            println!("✓ Configuration is valid!");
            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration is invalid!");
            println!("  Error: {}", e);
            Err(e)
        }
    }
}

fn show(workspace: &Workspace) -> Result<()> {
    let config = Config::load(workspace.root())?;

    println!("Effective Configuration:");
    println!("(CLI > Environment > Project config > Global config > Defaults)\n");

    println!("Agents:");
    println!(
        "  default: {}",
        config.agents.default.as_deref().unwrap_or("(auto)")
    );
    println!("  mock: {}", config.agents.mock);
    println!(
        "  detection_timeout: {}s",
        config.agents.detection_timeout_secs
    );
    let mut overrides: Vec<_> = config.agents.commands.iter().collect();
    overrides.sort();
    for (id, command) in overrides {
        println!("  command[{}]: {}", id, command);
    }

    println!("\nExecution:");
    println!("  timeout: {}s", config.execution.timeout_secs);
    println!("  strict_validation: {}", config.execution.strict_validation);

    println!("\nPrompts:");
    println!("  budget_chars: {}", config.prompts.budget_chars);
    println!("  max_command_chars: {}", config.prompts.max_command_chars);

    println!("\nAnalysis:");
    println!("  cache_ttl: {}s", config.analysis.cache_ttl_secs);
    if !config.analysis.important_files.is_empty() {
        println!("  important_files:");
        for file in &config.analysis.important_files {
            println!("    - {}", file.display());
        }
    }

    Ok(())
}
