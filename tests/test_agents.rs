use async_trait::async_trait;
use specpilot::agents::{
    AgentDetector, AgentEvent, AgentManager, AgentRegistry, Capability, CommandProbe, ProbeOutput,
};
use specpilot::error::SpecPilotError;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_agent_registry_loads() {
    let _registry = AgentRegistry::load().expect("Failed to load agent registry");
    // If we got here, all agent TOML files parsed successfully
}

#[test]
fn test_list_available_agents() {
    let registry = AgentRegistry::load().expect("Failed to load registry");
    assert_eq!(registry.list_available(), vec!["cloudai", "codegen"]);
}

#[test]
fn test_embedded_descriptors() {
    let registry = AgentRegistry::load().expect("Failed to load registry");

    let codegen = registry.get("codegen").expect("codegen should be known");
    assert_eq!(codegen.command(), "codegen");
    assert!(codegen.supports(Capability::Questionnaire));
    assert!(codegen.supports(Capability::ImplementationPlan));

    let cloudai = registry.get("cloudai").expect("cloudai should be known");
    assert!(cloudai.supports(Capability::ImplementationPlan));
    assert!(!cloudai.supports(Capability::CodeGeneration));
    assert!(cloudai.login_hint().contains("cloudai auth login"));
}

/// Only `cloudai` is installed, and it is logged out
struct CloudOnlyProbe;

#[async_trait]
impl CommandProbe for CloudOnlyProbe {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> std::io::Result<ProbeOutput> {
        match (program, args.first().map(String::as_str)) {
            ("cloudai", Some("version")) => Ok(ProbeOutput {
                success: true,
                stdout: "Cloud AI SDK 467.0.0\nbq 2.1.4\n".into(),
                stderr: String::new(),
            }),
            ("cloudai", Some("auth")) => Ok(ProbeOutput {
                success: true,
                stdout: String::new(),
                stderr: "No credentialed accounts.\n".into(),
            }),
            _ => Err(std::io::Error::new(std::io::ErrorKind::NotFound, "not installed")),
        }
    }
}

fn registry() -> AgentRegistry {
    AgentRegistry::load().expect("Failed to load registry")
}

#[tokio::test]
async fn test_detect_all_returns_one_status_per_descriptor() {
    let detector = AgentDetector::new(registry()).with_probe(Arc::new(CloudOnlyProbe));
    let statuses = detector.detect_all().await;

    let ids: Vec<_> = statuses.iter().map(|s| s.id().to_string()).collect();
    assert_eq!(ids, vec!["codegen", "cloudai"]);

    let codegen = &statuses[0];
    assert!(!codegen.is_available);
    assert_eq!(codegen.version, "Unknown");

    let cloudai = &statuses[1];
    assert!(cloudai.is_available);
    assert!(!cloudai.is_authenticated);
    assert_eq!(cloudai.version, "467.0.0");
}

#[tokio::test]
async fn test_mock_mode_is_deterministic() {
    let detector = AgentDetector::new(registry())
        .with_probe(Arc::new(CloudOnlyProbe))
        .with_mock_mode(true);

    let first = detector.detect_all().await;
    let second = detector.detect_all().await;

    for statuses in [&first, &second] {
        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(|s| s.is_available && s.is_authenticated));
    }
    let versions = |v: &[specpilot::agents::AgentStatus]| {
        v.iter().map(|s| s.version.clone()).collect::<Vec<_>>()
    };
    assert_eq!(versions(&first), versions(&second));
}

#[tokio::test]
async fn test_manager_selects_available_agent_and_notifies() {
    let detector = AgentDetector::new(registry()).with_probe(Arc::new(CloudOnlyProbe));
    let manager = AgentManager::new(detector);
    let mut events = manager.subscribe();

    let selected = manager.initialize().await.expect("cloudai should be selected");
    assert_eq!(selected.id(), "cloudai");
    assert!(!selected.is_authenticated);
    assert_eq!(manager.available_count(), 1);
    assert!(manager.authenticated_agents().is_empty());

    assert_eq!(
        events.recv().await.unwrap(),
        AgentEvent::DetectionRefreshed { available: 1 }
    );
    assert_eq!(
        events.recv().await.unwrap(),
        AgentEvent::SelectionChanged {
            agent: Some("cloudai".to_string())
        }
    );
}

#[tokio::test]
async fn test_switch_agent_fails_closed() {
    let detector = AgentDetector::new(registry()).with_probe(Arc::new(CloudOnlyProbe));
    let manager = AgentManager::new(detector);
    manager.initialize().await;

    let err = manager.switch_agent("nope").unwrap_err();
    assert!(matches!(err, SpecPilotError::AgentNotFound(_)));

    let err = manager.switch_agent("codegen").unwrap_err();
    assert!(matches!(err, SpecPilotError::AgentUnavailable(_)));

    assert_eq!(manager.selected().unwrap().id(), "cloudai");
    assert!(manager.supports_feature(Capability::ImplementationPlan));
    assert!(!manager.supports_feature(Capability::CodeGeneration));
}

#[tokio::test]
async fn test_supports_feature_false_without_selection() {
    struct NothingInstalled;

    #[async_trait]
    impl CommandProbe for NothingInstalled {
        async fn run(&self, _: &str, _: &[String], _: Duration) -> std::io::Result<ProbeOutput> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
        }
    }

    let detector = AgentDetector::new(registry()).with_probe(Arc::new(NothingInstalled));
    let manager = AgentManager::new(detector);
    assert!(manager.initialize().await.is_none());
    assert!(!manager.supports_feature(Capability::Questionnaire));
}
