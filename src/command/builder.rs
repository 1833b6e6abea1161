use super::shell::ShellFlavor;
use crate::agents::{AgentDescriptor, InvocationStyle};
use crate::error::{Result, SpecPilotError};
use crate::prompts::{self, Operation, PromptContext, DEFAULT_BUDGET_CHARS};
use std::path::Path;

/// Hard cap on the final command line
pub const DEFAULT_MAX_COMMAND_CHARS: usize = 8000;

const DEFAULT_MODEL_TYPE: &str = "text";

/// Turns an operation on a spec file into a shell command line for one agent.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    flavor: ShellFlavor,
    budget_chars: usize,
    max_command_chars: usize,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self {
            flavor: ShellFlavor::current(),
            budget_chars: DEFAULT_BUDGET_CHARS,
            max_command_chars: DEFAULT_MAX_COMMAND_CHARS,
        }
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flavor(mut self, flavor: ShellFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    pub fn with_budget(mut self, budget_chars: usize) -> Self {
        self.budget_chars = budget_chars;
        self
    }

    pub fn with_max_command_chars(mut self, max: usize) -> Self {
        self.max_command_chars = max;
        self
    }

    pub fn flavor(&self) -> ShellFlavor {
        self.flavor
    }

    /// Render the prompt and wrap it in the agent's invocation syntax.
    ///
    /// Fails when the agent lacks the operation's capability or when the
    /// escaped command exceeds the length cap.
    pub fn build(
        &self,
        agent: &AgentDescriptor,
        operation: Operation,
        file_path: &Path,
        context: &PromptContext,
    ) -> Result<String> {
        if !agent.supports(operation.capability()) {
            return Err(SpecPilotError::UnsupportedOperation {
                agent: agent.id().to_string(),
                operation: operation.task_label().to_string(),
            });
        }

        let file = file_path.to_string_lossy();
        let mut context = context.clone();
        if context.file_path.is_none() {
            context.file_path = Some(file.to_string());
        }
        let prompt = prompts::build_prompt(operation, agent.id(), &context, self.budget_chars);

        let args = invocation_args(agent, operation, &file, &prompt);
        let command = format!("{} {}", self.flavor.escape(agent.command()), self.flavor.join_args(&args));

        let length = command.chars().count();
        if length > self.max_command_chars {
            return Err(SpecPilotError::CommandTooLong {
                length,
                max: self.max_command_chars,
            });
        }

        tracing::debug!(
            "built {} command for {} ({} chars)",
            operation,
            agent.id(),
            length
        );
        Ok(command)
    }
}

fn invocation_args(
    agent: &AgentDescriptor,
    operation: Operation,
    file: &str,
    prompt: &str,
) -> Vec<String> {
    match agent.invocation.style {
        InvocationStyle::Code => vec![
            "code".to_string(),
            format!("--file={}", file),
            format!("--task={}", operation.task_label()),
            format!("--prompt={}", prompt),
        ],
        InvocationStyle::AiGenerate => {
            let model_type = agent
                .invocation
                .model_type
                .as_deref()
                .unwrap_or(DEFAULT_MODEL_TYPE);
            vec![
                "ai".to_string(),
                "generate".to_string(),
                format!("--input-file={}", file),
                format!("--prompt={}", prompt),
                format!("--model-type={}", model_type),
                format!("--task={}", operation.task_label()),
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentRegistry;

    fn agent(id: &str) -> std::sync::Arc<AgentDescriptor> {
        AgentRegistry::load().unwrap().get(id).unwrap()
    }

    fn context() -> PromptContext {
        PromptContext {
            project_summary: Some("Project Type: python".into()),
            feature_content: Some("Add login".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_code_style_invocation() {
        let cmd = CommandBuilder::new()
            .with_flavor(ShellFlavor::Posix)
            .build(
                &agent("codegen"),
                Operation::Questionnaire,
                Path::new("specs/login.md"),
                &context(),
            )
            .unwrap();

        assert!(cmd.starts_with("codegen code --file=specs/login.md --task=generate-questions '--prompt="));
        assert!(cmd.contains("Add login"));
    }

    #[test]
    fn test_ai_generate_style_invocation() {
        let cmd = CommandBuilder::new()
            .with_flavor(ShellFlavor::Posix)
            .build(
                &agent("cloudai"),
                Operation::ImplementationPlan,
                Path::new("plan.md"),
                &context(),
            )
            .unwrap();

        assert!(cmd.starts_with("cloudai ai generate --input-file=plan.md '--prompt="));
        assert!(cmd.ends_with("--model-type=text --task=implementation-plan"));
    }

    #[test]
    fn test_windows_flavor_quotes() {
        let cmd = CommandBuilder::new()
            .with_flavor(ShellFlavor::Windows)
            .build(
                &agent("codegen"),
                Operation::Questionnaire,
                Path::new("my spec.md"),
                &context(),
            )
            .unwrap();

        assert!(cmd.contains("\"--file=my spec.md\""));
        assert!(cmd.contains("\"--prompt="));
    }

    #[test]
    fn test_rejects_overlong_command() {
        let err = CommandBuilder::new()
            .with_max_command_chars(200)
            .build(
                &agent("codegen"),
                Operation::ImplementationPlan,
                Path::new("a.md"),
                &context(),
            )
            .unwrap_err();

        match err {
            SpecPilotError::CommandTooLong { length, max } => {
                assert_eq!(max, 200);
                assert!(length > 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_operation() {
        let descriptor: AgentDescriptor = toml::from_str(
            r#"
            [agent]
            id = "narrow"
            name = "Narrow"
            command = "narrow"
            capabilities = ["file_analysis"]
            "#,
        )
        .unwrap();

        let err = CommandBuilder::new()
            .build(&descriptor, Operation::Questionnaire, Path::new("a.md"), &context())
            .unwrap_err();
        assert!(matches!(err, SpecPilotError::UnsupportedOperation { .. }));
    }

    #[test]
    fn test_large_feature_is_truncated_not_rejected() {
        let mut ctx = context();
        ctx.feature_content = Some("word ".repeat(5000));
        let cmd = CommandBuilder::new()
            .with_flavor(ShellFlavor::Posix)
            .build(&agent("codegen"), Operation::Questionnaire, Path::new("a.md"), &ctx)
            .unwrap();
        assert!(cmd.contains("[... truncated]"));
        assert!(cmd.chars().count() <= DEFAULT_MAX_COMMAND_CHARS);
    }
}
