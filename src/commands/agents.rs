use crate::agents::{AgentManager, AgentStatus};
use crate::error::Result;
use serde_json::json;

pub fn execute(manager: &AgentManager, json: bool) -> Result<()> {
    let agents = manager.agents();
    let selected = manager.selected().map(|s| s.id().to_string());

    if json {
        let entries: Vec<_> = agents
            .iter()
            .map(|status| status_json(status, selected.as_deref() == Some(status.id())))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if manager.detector().is_mock() {
        println!("Agents (mock mode):");
    } else {
        println!("Agents:");
    }

    for status in agents.iter() {
        let marker = if selected.as_deref() == Some(status.id()) {
            "*"
        } else {
            " "
        };
        let state = match (status.is_available, status.is_authenticated) {
            (false, _) => "not installed".to_string(),
            (true, false) => format!("{} (not logged in)", status.version),
            (true, true) => status.version.clone(),
        };
        println!("  {} {:<10} {:<14} {}", marker, status.id(), status.name(), state);
    }

    match &selected {
        Some(id) => println!("\nSelected: {}", id),
        None => {
            println!("\nNo agent available.");
            println!("Install one of: {}", manager.detector().registry().list_available().join(", "));
        }
    }

    for status in agents.iter().filter(|s| s.is_available && !s.is_authenticated) {
        println!("{}", status.descriptor.login_hint());
    }

    Ok(())
}

fn status_json(status: &AgentStatus, selected: bool) -> serde_json::Value {
    json!({
        "id": status.id(),
        "name": status.name(),
        "command": status.descriptor.command(),
        "version": status.version,
        "available": status.is_available,
        "authenticated": status.is_authenticated,
        "selected": selected,
        "capabilities": status.descriptor.agent.capabilities,
    })
}
