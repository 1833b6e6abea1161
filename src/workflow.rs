//! End-to-end generation: spec file in, agent output appended.

use crate::agents::{AgentManager, AgentStatus};
use crate::command::{validate_command, CommandBuilder};
use crate::config::Config;
use crate::error::{Result, SpecPilotError};
use crate::execution::{CommandExecutionResult, ExecutionOptions, ExecutionService, TerminalSessions};
use crate::project::{
    analyze_important_files, format_file_analyses, project_summary, ContextCache, ProjectAnalyzer,
    Workspace,
};
use crate::prompts::{Operation, PromptContext};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Name of the shared interactive session used in terminal mode
pub const TERMINAL_SESSION: &str = "specpilot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Capture output and append it to the spec file
    #[default]
    Capture,
    /// Type the command into the interactive session
    Terminal,
    /// Build the command only
    DryRun,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub operation: Operation,
    pub spec_file: PathBuf,
    /// Added to the configured important files
    pub important_files: Vec<PathBuf>,
    pub implementation_context: Option<String>,
    /// File whose content fills the prompt's file section
    pub context_file: Option<PathBuf>,
    pub mode: RunMode,
    pub cancel: Option<CancellationToken>,
}

impl GenerateRequest {
    pub fn new(operation: Operation, spec_file: impl Into<PathBuf>) -> Self {
        Self {
            operation,
            spec_file: spec_file.into(),
            important_files: Vec::new(),
            implementation_context: None,
            context_file: None,
            mode: RunMode::Capture,
            cancel: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub agent: String,
    pub spec_file: PathBuf,
    pub command: String,
    /// Absent in dry-run and terminal mode
    pub result: Option<CommandExecutionResult>,
    pub appended: bool,
}

pub struct Workflow {
    workspace: Workspace,
    config: Config,
    manager: Arc<AgentManager>,
    analyzer: ProjectAnalyzer,
    builder: CommandBuilder,
    executor: ExecutionService,
    terminals: TerminalSessions,
}

impl Workflow {
    pub fn new(workspace: Workspace, config: Config, manager: Arc<AgentManager>) -> Self {
        let analyzer = ProjectAnalyzer::with_cache(ContextCache::new(config.cache_ttl()));
        let builder = CommandBuilder::new()
            .with_budget(config.prompts.budget_chars)
            .with_max_command_chars(config.prompts.max_command_chars);
        let executor = ExecutionService::new(workspace.root());
        let terminals = TerminalSessions::new(workspace.root());

        Self {
            workspace,
            config,
            manager,
            analyzer,
            builder,
            executor,
            terminals,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn manager(&self) -> &AgentManager {
        &self.manager
    }

    pub fn analyzer(&self) -> &ProjectAnalyzer {
        &self.analyzer
    }

    pub fn executor(&self) -> &ExecutionService {
        &self.executor
    }

    pub fn terminals(&self) -> &TerminalSessions {
        &self.terminals
    }

    /// Tear down: terminate in-flight commands, then wait for terminal
    /// sessions to finish
    pub async fn shutdown(&self) {
        let killed = self.executor.kill_all();
        if killed > 0 {
            tracing::debug!("shutdown terminated {} command(s)", killed);
        }
        self.terminals.close_all().await;
    }

    /// Selected agent, checked against the operation's capability
    fn agent_for(&self, operation: Operation) -> Result<AgentStatus> {
        let status = self.manager.selected().ok_or(SpecPilotError::NoAgentSelected)?;
        if !status.is_available {
            return Err(SpecPilotError::AgentUnavailable(status.id().to_string()));
        }
        if !status.descriptor.supports(operation.capability()) {
            return Err(SpecPilotError::UnsupportedOperation {
                agent: status.id().to_string(),
                operation: operation.task_label().to_string(),
            });
        }
        if !status.is_authenticated {
            tracing::warn!("{} does not appear to be logged in", status.name());
        }
        Ok(status)
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateReport> {
        let agent = self.agent_for(request.operation)?;
        let root = self.workspace.root();

        let spec_path = self.workspace.resolve(&request.spec_file);
        if !spec_path.is_file() {
            return Err(SpecPilotError::SpecFileNotFound(spec_path));
        }
        let feature = std::fs::read_to_string(&spec_path)?;
        let display_path = spec_path
            .strip_prefix(root)
            .unwrap_or(&spec_path)
            .to_path_buf();

        let context = self.analyzer.analyze(root)?;

        let mut important = self.config.analysis.important_files.clone();
        important.extend(request.important_files.iter().cloned());
        let analyses = analyze_important_files(root, &important);

        let file_content = match &request.context_file {
            Some(path) => Some(std::fs::read_to_string(self.workspace.resolve(path))?),
            None => None,
        };

        let prompt_context = PromptContext {
            project_summary: Some(project_summary(&context)),
            feature_content: Some(feature),
            implementation_context: request.implementation_context.clone(),
            file_content,
            file_path: Some(display_path.display().to_string()),
            important_files_analysis: (!analyses.is_empty()).then(|| format_file_analyses(&analyses)),
        };

        let command = self.builder.build(
            &agent.descriptor,
            request.operation,
            &display_path,
            &prompt_context,
        )?;
        self.screen(&command)?;

        let mut report = GenerateReport {
            agent: agent.id().to_string(),
            spec_file: spec_path.clone(),
            command: command.clone(),
            result: None,
            appended: false,
        };

        match request.mode {
            RunMode::DryRun => return Ok(report),
            RunMode::Terminal => {
                self.terminals.run(TERMINAL_SESSION, &command).await?;
                return Ok(report);
            }
            RunMode::Capture => {}
        }

        let options = ExecutionOptions {
            cwd: Some(root.to_path_buf()),
            timeout: Some(self.config.execution_timeout()),
            cancel: request.cancel.clone(),
            agent: Some(Arc::clone(&agent.descriptor)),
        };
        let result = self.executor.execute(&command, options).await;

        if result.success && !result.output.trim().is_empty() {
            append_section(&spec_path, request.operation, agent.name(), &result.output)?;
            report.appended = true;
            tracing::info!(
                "appended {} to {}",
                request.operation.section_heading(),
                spec_path.display()
            );
        }

        report.result = Some(result);
        Ok(report)
    }

    /// Advisory check; only refuses when strict validation is configured
    fn screen(&self, command: &str) -> Result<()> {
        let validation = validate_command(command);
        if validation.is_valid {
            return Ok(());
        }
        if validation.dangerous {
            if self.config.execution.strict_validation {
                return Err(SpecPilotError::UnsafeCommand(validation.issues.join("; ")));
            }
            tracing::warn!("command {}", validation.issues.join("; "));
        } else {
            tracing::debug!("command {}", validation.issues.join("; "));
        }
        Ok(())
    }
}

/// Append generated output under the operation's heading
pub fn append_section(
    spec_path: &Path,
    operation: Operation,
    agent_name: &str,
    output: &str,
) -> Result<()> {
    let existing = std::fs::read_to_string(spec_path)?;
    let separator = if existing.is_empty() || existing.ends_with("\n\n") {
        ""
    } else if existing.ends_with('\n') {
        "\n"
    } else {
        "\n\n"
    };

    let mut file = OpenOptions::new().append(true).open(spec_path)?;
    write!(
        file,
        "{}{}\n\n_Generated by {} on {}_\n\n{}\n",
        separator,
        operation.section_heading(),
        agent_name,
        chrono::Local::now().format("%Y-%m-%d %H:%M"),
        output.trim()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AgentDetector, AgentRegistry};
    use tempfile::TempDir;

    fn workflow(root: &Path) -> Workflow {
        let detector = AgentDetector::new(AgentRegistry::load().unwrap()).with_mock_mode(true);
        Workflow::new(
            Workspace::from_path(root).unwrap(),
            Config::default(),
            Arc::new(AgentManager::new(detector)),
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_terminates_running_commands() {
        let temp = TempDir::new().unwrap();
        let workflow = workflow(temp.path());

        let executor = workflow.executor().clone();
        let handle = tokio::spawn(async move {
            executor
                .execute("sleep 30", ExecutionOptions::default())
                .await
        });

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while workflow.executor().running_count() == 0 && std::time::Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        workflow.shutdown().await;

        let result = handle.await.unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Command was terminated"));
        assert_eq!(workflow.executor().running_count(), 0);
    }

    #[test]
    fn test_append_section_format() {
        let temp = TempDir::new().unwrap();
        let spec = temp.path().join("feature.md");
        std::fs::write(&spec, "# Feature\nText").unwrap();

        append_section(&spec, Operation::Questionnaire, "CodeGen CLI", "1. Why?\n\n").unwrap();

        let content = std::fs::read_to_string(&spec).unwrap();
        assert!(content.starts_with("# Feature\nText\n\n## Clarifying Questions\n\n_Generated by CodeGen CLI on "));
        assert!(content.ends_with("_\n\n1. Why?\n"));
    }

    #[test]
    fn test_append_section_after_trailing_newline() {
        let temp = TempDir::new().unwrap();
        let spec = temp.path().join("feature.md");
        std::fs::write(&spec, "# Feature\n").unwrap();

        append_section(&spec, Operation::ImplementationPlan, "Cloud AI CLI", "Step 1").unwrap();

        let content = std::fs::read_to_string(&spec).unwrap();
        assert!(content.starts_with("# Feature\n\n## Implementation Plan\n"));
    }
}
