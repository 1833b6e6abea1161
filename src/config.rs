use crate::error::{Result, SpecPilotError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = ".specpilot.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub agents: AgentsConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Verbosity from `-v` (not stored in config file)
    #[serde(skip)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentsConfig {
    /// Agent to prefer when auto-selecting
    #[serde(default)]
    pub default: Option<String>,

    /// Report every agent as installed and logged in without probing
    #[serde(default)]
    pub mock: bool,

    #[serde(default = "default_detection_timeout")]
    pub detection_timeout_secs: u64,

    /// Per-agent command path overrides, keyed by agent id
    #[serde(default)]
    pub commands: HashMap<String, String>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            default: None,
            mock: false,
            detection_timeout_secs: default_detection_timeout(),
            commands: HashMap::new(),
        }
    }
}

fn default_detection_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Refuse to run commands that fail validation instead of warning
    #[serde(default)]
    pub strict_validation: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            strict_validation: false,
        }
    }
}

fn default_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptsConfig {
    #[serde(default = "default_budget")]
    pub budget_chars: usize,

    #[serde(default = "default_max_command")]
    pub max_command_chars: usize,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            budget_chars: default_budget(),
            max_command_chars: default_max_command(),
        }
    }
}

fn default_budget() -> usize {
    crate::prompts::DEFAULT_BUDGET_CHARS
}

fn default_max_command() -> usize {
    crate::command::DEFAULT_MAX_COMMAND_CHARS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Files always attached to prompts, relative to the workspace root
    #[serde(default)]
    pub important_files: Vec<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            important_files: Vec::new(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    300
}

/// One config file as written. Unset keys leave lower layers alone.
#[derive(Debug, Default, Deserialize)]
struct ConfigLayer {
    #[serde(default)]
    agents: AgentsLayer,
    #[serde(default)]
    execution: ExecutionLayer,
    #[serde(default)]
    prompts: PromptsLayer,
    #[serde(default)]
    analysis: AnalysisLayer,
}

#[derive(Debug, Default, Deserialize)]
struct AgentsLayer {
    default: Option<String>,
    mock: Option<bool>,
    detection_timeout_secs: Option<u64>,
    #[serde(default)]
    commands: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExecutionLayer {
    timeout_secs: Option<u64>,
    strict_validation: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PromptsLayer {
    budget_chars: Option<usize>,
    max_command_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisLayer {
    cache_ttl_secs: Option<u64>,
    #[serde(default)]
    important_files: Vec<PathBuf>,
}

impl ConfigLayer {
    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Values from the command line, applied last
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub verbose: u8,
    pub mock_agents: bool,
    pub agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration with precedence:
    /// 1. CLI flags (applied later via with_cli_overrides)
    /// 2. Environment variables
    /// 3. Project config (.specpilot.toml in workspace root)
    /// 4. Global config (~/.specpilot.toml)
    /// 5. Built-in defaults
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_config) = global_config_path() {
            if global_config.exists() {
                config = config.merge(ConfigLayer::from_file(&global_config)?);
            }
        }

        let project_config = project_config_path(workspace_root);
        if project_config.exists() {
            config = config.merge(ConfigLayer::from_file(&project_config)?);
        }

        config = config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Apply a file layer; every key the layer sets wins
    fn merge(mut self, layer: ConfigLayer) -> Self {
        // Agents
        if layer.agents.default.is_some() {
            self.agents.default = layer.agents.default;
        }
        if let Some(mock) = layer.agents.mock {
            self.agents.mock = mock;
        }
        if let Some(timeout) = layer.agents.detection_timeout_secs {
            self.agents.detection_timeout_secs = timeout;
        }
        self.agents.commands.extend(layer.agents.commands);

        // Execution
        if let Some(timeout) = layer.execution.timeout_secs {
            self.execution.timeout_secs = timeout;
        }
        if let Some(strict) = layer.execution.strict_validation {
            self.execution.strict_validation = strict;
        }

        // Prompts
        if let Some(budget) = layer.prompts.budget_chars {
            self.prompts.budget_chars = budget;
        }
        if let Some(max) = layer.prompts.max_command_chars {
            self.prompts.max_command_chars = max;
        }

        // Analysis (important files append)
        if let Some(ttl) = layer.analysis.cache_ttl_secs {
            self.analysis.cache_ttl_secs = ttl;
        }
        self.analysis
            .important_files
            .extend(layer.analysis.important_files);

        self
    }

    /// Apply environment variable overrides
    fn merge_env(mut self) -> Self {
        if let Ok(mock) = std::env::var("SPECPILOT_MOCK_AGENTS") {
            self.agents.mock = is_truthy(&mock);
        }

        if let Ok(timeout) = std::env::var("SPECPILOT_TIMEOUT") {
            match timeout.parse::<u64>() {
                Ok(timeout) => self.execution.timeout_secs = timeout,
                Err(_) => tracing::warn!("ignoring invalid SPECPILOT_TIMEOUT: {}", timeout),
            }
        }

        self
    }

    /// Apply CLI overrides (highest precedence)
    pub fn with_cli_overrides(mut self, overrides: &CliOverrides) -> Self {
        self.verbose = overrides.verbose;
        if overrides.mock_agents {
            self.agents.mock = true;
        }
        if let Some(agent) = &overrides.agent {
            self.agents.default = Some(agent.clone());
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.execution.timeout_secs = timeout;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.execution.timeout_secs == 0 {
            return Err(SpecPilotError::InvalidConfig(
                "execution.timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.agents.detection_timeout_secs == 0 {
            return Err(SpecPilotError::InvalidConfig(
                "agents.detection_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.prompts.max_command_chars < self.prompts.budget_chars {
            return Err(SpecPilotError::InvalidConfig(format!(
                "prompts.max_command_chars ({}) must be at least prompts.budget_chars ({})",
                self.prompts.max_command_chars, self.prompts.budget_chars
            )));
        }
        Ok(())
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution.timeout_secs)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_secs(self.agents.detection_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.analysis.cache_ttl_secs)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn global_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

pub fn project_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_FILE_NAME)
}

/// Get the home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
