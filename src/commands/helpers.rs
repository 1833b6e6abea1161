use crate::agents::{AgentDetector, AgentManager, AgentRegistry};
use crate::config::Config;
use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Build the agent manager described by `config` and run initial detection
pub async fn init_manager(config: &Config) -> Result<Arc<AgentManager>> {
    let registry = AgentRegistry::load()?.with_command_overrides(&config.agents.commands);
    let detector = AgentDetector::new(registry)
        .with_timeout(config.detection_timeout())
        .with_mock_mode(config.agents.mock);
    let manager = AgentManager::new(detector).with_preferred(config.agents.default.clone());

    manager.initialize().await;
    Ok(Arc::new(manager))
}

/// Spinner on stderr while a long step runs; hidden when stderr is not a terminal
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        bar.set_style(style);
    }
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_manager_in_mock_mode_selects_preferred() {
        let mut config = Config::default();
        config.agents.mock = true;
        config.agents.default = Some("cloudai".to_string());

        let manager = init_manager(&config).await.unwrap();
        assert_eq!(manager.available_count(), 2);
        assert_eq!(manager.selected().unwrap().id(), "cloudai");
    }

    #[tokio::test]
    async fn test_command_overrides_are_applied() {
        let mut config = Config::default();
        config.agents.mock = true;
        config
            .agents
            .commands
            .insert("codegen".to_string(), "/opt/bin/codegen".to_string());

        let manager = init_manager(&config).await.unwrap();
        let codegen = manager
            .agents()
            .iter()
            .find(|s| s.id() == "codegen")
            .cloned()
            .unwrap();
        assert_eq!(codegen.descriptor.command(), "/opt/bin/codegen");
    }
}
