//! Probe the host for installed agent CLIs.
//!
//! Each known descriptor is probed in its own task: a version check decides
//! availability, then the optional auth-status subcommand decides whether
//! the user is logged in. One tool failing never affects another.

use super::auth::heuristic_for;
use super::definition::AgentDescriptor;
use super::registry::AgentRegistry;
use async_trait::async_trait;
use regex::Regex;
use semver::Version;
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::process::Command;

pub const DEFAULT_DETECTION_TIMEOUT: Duration = Duration::from_secs(5);
pub const UNKNOWN_VERSION: &str = "Unknown";
pub const MOCK_VERSION: &str = "0.0.0-mock";

/// Point-in-time detection result for one agent.
#[derive(Debug, Clone)]
pub struct AgentStatus {
    pub descriptor: Arc<AgentDescriptor>,
    pub version: String,
    pub is_available: bool,
    pub is_authenticated: bool,
}

impl AgentStatus {
    fn unavailable(descriptor: Arc<AgentDescriptor>) -> Self {
        Self {
            descriptor,
            version: UNKNOWN_VERSION.to_string(),
            is_available: false,
            is_authenticated: false,
        }
    }

    fn mock(descriptor: Arc<AgentDescriptor>) -> Self {
        Self {
            descriptor,
            version: MOCK_VERSION.to_string(),
            is_available: true,
            is_authenticated: true,
        }
    }

    pub fn id(&self) -> &str {
        self.descriptor.id()
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Detected version as semver, when one was found
    pub fn semver(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }
}

/// Captured output of a short-lived probe process.
#[derive(Debug, Clone, Default)]
pub struct ProbeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeOutput {
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs a probe subprocess. Swapped out in tests for canned responses.
#[async_trait]
pub trait CommandProbe: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> std::io::Result<ProbeOutput>;
}

/// Probe that resolves the program on `PATH` and spawns it directly.
pub struct SystemProbe;

#[async_trait]
impl CommandProbe for SystemProbe {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> std::io::Result<ProbeOutput> {
        let resolved = which::which(program).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found: {}", program, e),
            )
        })?;

        let mut cmd = Command::new(resolved);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{} did not answer within {}s", program, timeout.as_secs()),
                )
            })??;

        Ok(ProbeOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Detects every agent of a registry.
pub struct AgentDetector {
    registry: AgentRegistry,
    probe: Arc<dyn CommandProbe>,
    timeout: Duration,
    mock: bool,
}

impl AgentDetector {
    pub fn new(registry: AgentRegistry) -> Self {
        Self {
            registry,
            probe: Arc::new(SystemProbe),
            timeout: DEFAULT_DETECTION_TIMEOUT,
            mock: false,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn CommandProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report every agent as installed and logged in without spawning anything
    pub fn with_mock_mode(mut self, mock: bool) -> Self {
        self.mock = mock;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// Detect all known agents. Returns exactly one status per descriptor,
    /// in registry order.
    pub async fn detect_all(&self) -> Vec<AgentStatus> {
        let descriptors = self.registry.descriptors();

        if self.mock {
            tracing::debug!("mock mode: reporting {} agents as ready", descriptors.len());
            return descriptors.iter().cloned().map(AgentStatus::mock).collect();
        }

        let handles: Vec<_> = descriptors
            .iter()
            .map(|descriptor| {
                let probe = Arc::clone(&self.probe);
                let descriptor = Arc::clone(descriptor);
                let timeout = self.timeout;
                tokio::spawn(async move { detect_one(probe.as_ref(), descriptor, timeout).await })
            })
            .collect();

        let mut statuses = Vec::with_capacity(descriptors.len());
        for (handle, descriptor) in handles.into_iter().zip(descriptors.iter()) {
            match handle.await {
                Ok(status) => statuses.push(status),
                Err(e) => {
                    tracing::warn!("detection task for {} failed: {}", descriptor.id(), e);
                    statuses.push(AgentStatus::unavailable(Arc::clone(descriptor)));
                }
            }
        }
        statuses
    }
}

/// Probe a single agent
pub async fn detect_one(
    probe: &dyn CommandProbe,
    descriptor: Arc<AgentDescriptor>,
    timeout: Duration,
) -> AgentStatus {
    let meta = &descriptor.agent;
    let version_args = vec![meta.version_flag.clone()];

    let version_output = match probe.run(&meta.command, &version_args, timeout).await {
        Ok(output) if output.success => output,
        Ok(output) => {
            tracing::debug!(
                "{} version check exited unsuccessfully: {}",
                meta.id,
                output.stderr.trim()
            );
            return AgentStatus::unavailable(descriptor);
        }
        Err(e) => {
            tracing::debug!("{} version check failed: {}", meta.id, e);
            return AgentStatus::unavailable(descriptor);
        }
    };

    let version =
        parse_version(&version_output.combined()).unwrap_or_else(|| UNKNOWN_VERSION.to_string());

    let is_authenticated = match &meta.auth_check {
        None => true,
        Some(args) => match probe.run(&meta.command, args, timeout).await {
            Ok(output) if !output.success => {
                tracing::debug!(
                    "{} auth check exited unsuccessfully: {}",
                    meta.id,
                    output.stderr.trim()
                );
                false
            }
            Ok(output) => {
                heuristic_for(meta.auth_heuristic).is_authenticated(&output.combined())
            }
            Err(e) => {
                tracing::debug!("{} auth check failed: {}", meta.id, e);
                false
            }
        },
    };

    tracing::debug!(
        "{} detected: version {}, authenticated {}",
        meta.id,
        version,
        is_authenticated
    );

    AgentStatus {
        descriptor,
        version,
        is_available: true,
        is_authenticated,
    }
}

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("version pattern is valid"))
}

/// Extract the first `major.minor.patch` substring
pub fn parse_version(output: &str) -> Option<String> {
    version_pattern().find(output).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Canned responses keyed by "program arg arg"
    struct FakeProbe {
        responses: HashMap<String, std::io::Result<ProbeOutput>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn ok(mut self, key: &str, success: bool, stdout: &str) -> Self {
            self.responses.insert(
                key.to_string(),
                Ok(ProbeOutput {
                    success,
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
            );
            self
        }

        fn err(mut self, key: &str, kind: std::io::ErrorKind) -> Self {
            self.responses
                .insert(key.to_string(), Err(std::io::Error::new(kind, "probe failed")));
            self
        }
    }

    #[async_trait]
    impl CommandProbe for FakeProbe {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Duration,
        ) -> std::io::Result<ProbeOutput> {
            let key = format!("{} {}", program, args.join(" "));
            self.calls.lock().unwrap().push(key.clone());
            match self.responses.get(&key) {
                Some(Ok(output)) => Ok(output.clone()),
                Some(Err(e)) => Err(std::io::Error::new(e.kind(), e.to_string())),
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "not installed",
                )),
            }
        }
    }

    fn detector(probe: FakeProbe) -> AgentDetector {
        AgentDetector::new(AgentRegistry::load().unwrap()).with_probe(Arc::new(probe))
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("codegen 1.4.2 (build 77)"), Some("1.4.2".into()));
        assert_eq!(
            parse_version("Cloud AI SDK 455.0.0\nbq 2.1.3"),
            Some("455.0.0".into())
        );
        assert_eq!(parse_version("version unknown"), None);
        assert_eq!(parse_version("v2.1"), None);
        // Leading zeros are kept as printed
        assert_eq!(parse_version("tool 1.02.3"), Some("1.02.3".into()));
    }

    #[tokio::test]
    async fn test_detect_all_none_installed() {
        let statuses = detector(FakeProbe::new()).detect_all().await;
        assert_eq!(statuses.len(), 2);
        for status in &statuses {
            assert!(!status.is_available);
            assert!(!status.is_authenticated);
            assert_eq!(status.version, UNKNOWN_VERSION);
        }
        assert_eq!(statuses[0].id(), "codegen");
        assert_eq!(statuses[1].id(), "cloudai");
    }

    #[tokio::test]
    async fn test_detect_available_and_authenticated() {
        let probe = FakeProbe::new()
            .ok("codegen --version", true, "codegen 1.4.2")
            .ok("codegen auth status", true, "Logged in as dev@example.com");
        let statuses = detector(probe).detect_all().await;

        let codegen = &statuses[0];
        assert!(codegen.is_available);
        assert!(codegen.is_authenticated);
        assert_eq!(codegen.version, "1.4.2");
        assert_eq!(codegen.semver(), Some(Version::new(1, 4, 2)));

        // cloudai failure is isolated from codegen
        assert!(!statuses[1].is_available);
    }

    #[tokio::test]
    async fn test_detect_available_not_authenticated() {
        let probe = FakeProbe::new()
            .ok("cloudai version", true, "Cloud AI CLI 455.0.0")
            .ok("cloudai auth list", true, "No credentialed accounts.");
        let statuses = detector(probe).detect_all().await;

        let cloudai = &statuses[1];
        assert!(cloudai.is_available);
        assert!(!cloudai.is_authenticated);
    }

    #[tokio::test]
    async fn test_nonzero_auth_exit_is_unauthenticated() {
        let probe = FakeProbe::new()
            .ok("codegen --version", true, "codegen 1.4.2")
            .ok(
                "codegen auth status",
                false,
                "Session for dev@example.com could not be verified",
            );
        let statuses = detector(probe).detect_all().await;

        let codegen = &statuses[0];
        assert!(codegen.is_available);
        assert!(!codegen.is_authenticated);
        assert_eq!(codegen.version, "1.4.2");
    }

    #[tokio::test]
    async fn test_auth_probe_error_is_unauthenticated() {
        let probe = FakeProbe::new()
            .ok("cloudai version", true, "Cloud AI CLI 455.0.0")
            .err("cloudai auth list", std::io::ErrorKind::TimedOut);
        let statuses = detector(probe).detect_all().await;

        let cloudai = &statuses[1];
        assert!(cloudai.is_available);
        assert!(!cloudai.is_authenticated);
    }

    #[tokio::test]
    async fn test_nonzero_version_exit_is_unavailable() {
        let probe = FakeProbe::new().ok("codegen --version", false, "");
        let statuses = detector(probe).detect_all().await;
        assert!(!statuses[0].is_available);
    }

    #[tokio::test]
    async fn test_version_without_semver_is_unknown() {
        let probe = FakeProbe::new()
            .ok("codegen --version", true, "codegen nightly")
            .ok("codegen auth status", true, "authenticated");
        let statuses = detector(probe).detect_all().await;
        assert!(statuses[0].is_available);
        assert_eq!(statuses[0].version, UNKNOWN_VERSION);
    }

    #[tokio::test]
    async fn test_mock_mode_spawns_nothing() {
        let probe = Arc::new(FakeProbe::new());
        let detector = AgentDetector::new(AgentRegistry::load().unwrap())
            .with_probe(probe.clone())
            .with_mock_mode(true);

        for _ in 0..3 {
            let statuses = detector.detect_all().await;
            assert_eq!(statuses.len(), 2);
            assert!(statuses.iter().all(|s| s.is_available && s.is_authenticated));
        }
        assert!(probe.calls.lock().unwrap().is_empty());
    }
}
