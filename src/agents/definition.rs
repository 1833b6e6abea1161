//! Data structures for parsing agent TOML files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An agent descriptor loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentDescriptor {
    /// Agent metadata (id, name, command, probes)
    pub agent: AgentMeta,

    /// How prompts are passed to the tool
    #[serde(default)]
    pub invocation: InvocationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,

    #[serde(default = "default_version_flag")]
    pub version_flag: String,

    /// Subcommand whose output tells whether the user is logged in
    #[serde(default)]
    pub auth_check: Option<Vec<String>>,

    /// Command the user should run to log in, used in remediation hints
    #[serde(default)]
    pub login_command: Option<String>,

    #[serde(default)]
    pub auth_heuristic: AuthHeuristicKind,

    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

fn default_version_flag() -> String {
    "--version".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InvocationConfig {
    #[serde(default)]
    pub style: InvocationStyle,

    /// Model kind passed to `ai generate` style tools
    #[serde(default)]
    pub model_type: Option<String>,
}

/// Flag convention used to hand a prompt to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationStyle {
    /// `<tool> code --file=<path> --task=<label> --prompt=<text>`
    #[default]
    Code,
    /// `<tool> ai generate --input-file=<path> --prompt=<text> --model-type=<kind> --task=<label>`
    AiGenerate,
}

/// Which output heuristic decides whether a tool is logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthHeuristicKind {
    /// Status output reports login state in prose
    #[default]
    StatusPhrase,
    /// Status output lists accounts, one `user@domain` per line
    AccountLine,
}

/// Feature an agent can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Questionnaire,
    ImplementationPlan,
    CodeGeneration,
    FileAnalysis,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Questionnaire => "questionnaire",
            Capability::ImplementationPlan => "implementation_plan",
            Capability::CodeGeneration => "code_generation",
            Capability::FileAnalysis => "file_analysis",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AgentDescriptor {
    pub fn id(&self) -> &str {
        &self.agent.id
    }

    pub fn name(&self) -> &str {
        &self.agent.name
    }

    pub fn command(&self) -> &str {
        &self.agent.command
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.agent.capabilities.contains(&capability)
    }

    /// Remediation hint shown when the tool rejects us for missing credentials
    pub fn login_hint(&self) -> String {
        let login = self
            .agent
            .login_command
            .clone()
            .unwrap_or_else(|| format!("{} login", self.agent.command));
        format!(
            "{} is not authenticated. Run `{}` in a terminal, then try again.",
            self.agent.name, login
        )
    }
}
