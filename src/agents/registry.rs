//! Agent registry for loading and managing known agents.

use super::definition::AgentDescriptor;
use crate::error::{Result, SpecPilotError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of known agents, in a stable order
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<Arc<AgentDescriptor>>,
}

impl AgentRegistry {
    /// Load the embedded agent descriptors
    pub fn load() -> Result<Self> {
        let agents = vec![
            Arc::new(parse_descriptor(
                "codegen",
                include_str!("../../agents/codegen/agent.toml"),
            )?),
            Arc::new(parse_descriptor(
                "cloudai",
                include_str!("../../agents/cloudai/agent.toml"),
            )?),
        ];

        Ok(Self { agents })
    }

    /// Build a registry from already-parsed descriptors
    pub fn from_descriptors(descriptors: Vec<AgentDescriptor>) -> Result<Self> {
        for descriptor in &descriptors {
            validate_descriptor(descriptor)?;
        }
        Ok(Self {
            agents: descriptors.into_iter().map(Arc::new).collect(),
        })
    }

    /// Replace the invocation command of agents listed in `overrides` (id -> command)
    pub fn with_command_overrides(mut self, overrides: &HashMap<String, String>) -> Self {
        for agent in &mut self.agents {
            if let Some(command) = overrides.get(&agent.agent.id) {
                let mut descriptor = (**agent).clone();
                descriptor.agent.command = command.clone();
                *agent = Arc::new(descriptor);
            }
        }
        self
    }

    /// Get an agent by ID
    pub fn get(&self, id: &str) -> Option<Arc<AgentDescriptor>> {
        self.agents.iter().find(|a| a.agent.id == id).cloned()
    }

    /// All descriptors in registry order
    pub fn descriptors(&self) -> &[Arc<AgentDescriptor>] {
        &self.agents
    }

    /// List all known agent IDs, sorted
    pub fn list_available(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.agents.iter().map(|a| a.agent.id.clone()).collect();
        ids.sort();
        ids
    }
}

/// Validate that an agent descriptor is complete and usable
fn validate_descriptor(descriptor: &AgentDescriptor) -> Result<()> {
    if descriptor.agent.id.is_empty() {
        return Err(SpecPilotError::InvalidConfig(
            "Agent id cannot be empty".to_string(),
        ));
    }
    if descriptor.agent.command.trim().is_empty() {
        return Err(SpecPilotError::InvalidConfig(format!(
            "Agent '{}' command cannot be empty",
            descriptor.agent.id
        )));
    }
    if let Some(check) = &descriptor.agent.auth_check {
        if check.is_empty() {
            return Err(SpecPilotError::InvalidConfig(format!(
                "Agent '{}' has an empty auth_check; remove it or list the subcommand",
                descriptor.agent.id
            )));
        }
    }
    Ok(())
}

fn parse_descriptor(id: &str, toml_content: &str) -> Result<AgentDescriptor> {
    let descriptor: AgentDescriptor = toml::from_str(toml_content).map_err(|e| {
        SpecPilotError::InvalidConfig(format!("Failed to parse {} agent definition: {}", id, e))
    })?;
    validate_descriptor(&descriptor)?;
    Ok(descriptor)
}
