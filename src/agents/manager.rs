//! Agent inventory and selection.
//!
//! `AgentManager` is constructed once by the caller and shared by reference
//! (or `Arc`) with every component that needs the selected agent. It holds
//! the latest detection snapshot and the selected agent id; both are
//! replaced together under one lock so readers never see a selection that
//! points outside the snapshot.

use super::definition::Capability;
use super::detector::{AgentDetector, AgentStatus};
use crate::error::{Result, SpecPilotError};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Notifications published when inventory or selection changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    DetectionRefreshed { available: usize },
    SelectionChanged { agent: Option<String> },
}

#[derive(Debug, Default)]
struct ManagerState {
    snapshot: Arc<Vec<AgentStatus>>,
    selected: Option<String>,
}

impl ManagerState {
    fn selected_status(&self) -> Option<&AgentStatus> {
        let id = self.selected.as_deref()?;
        self.snapshot.iter().find(|s| s.id() == id)
    }
}

pub struct AgentManager {
    detector: AgentDetector,
    preferred: Option<String>,
    state: RwLock<ManagerState>,
    events: broadcast::Sender<AgentEvent>,
}

impl AgentManager {
    pub fn new(detector: AgentDetector) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            detector,
            preferred: None,
            state: RwLock::new(ManagerState::default()),
            events,
        }
    }

    /// Agent to favour on auto-selection when it is available
    pub fn with_preferred(mut self, preferred: Option<String>) -> Self {
        self.preferred = preferred;
        self
    }

    /// Subscribe to inventory and selection changes
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    /// Run detection and auto-select an agent
    pub async fn initialize(&self) -> Option<AgentStatus> {
        let statuses = self.detector.detect_all().await;
        let preferred = self.preferred.as_deref();
        self.publish(statuses, |statuses, _| auto_select(statuses, preferred))
    }

    /// Re-run detection, keeping the current selection while it stays usable
    pub async fn refresh(&self) -> Option<AgentStatus> {
        let statuses = self.detector.detect_all().await;
        let preferred = self.preferred.as_deref();
        self.publish(statuses, |statuses, current| {
            current
                .filter(|id| statuses.iter().any(|s| s.id() == *id && s.is_available))
                .map(str::to_string)
                .or_else(|| auto_select(statuses, preferred))
        })
    }

    /// Install a new snapshot. `choose` sees the selection current at
    /// install time and runs under the same write guard.
    fn publish(
        &self,
        statuses: Vec<AgentStatus>,
        choose: impl FnOnce(&[AgentStatus], Option<&str>) -> Option<String>,
    ) -> Option<AgentStatus> {
        let available = statuses.iter().filter(|s| s.is_available).count();

        let (selected, status) = {
            let mut state = self.write_state();
            let selected = choose(&statuses, state.selected.as_deref());
            state.snapshot = Arc::new(statuses);
            state.selected = selected.clone();
            (selected, state.selected_status().cloned())
        };

        match &selected {
            Some(id) => tracing::info!("selected agent: {}", id),
            None => tracing::info!("no agent available for selection"),
        }

        // Nobody listening is fine
        let _ = self.events.send(AgentEvent::DetectionRefreshed { available });
        let _ = self.events.send(AgentEvent::SelectionChanged { agent: selected });
        status
    }

    /// Select an agent by id.
    ///
    /// Fails, leaving the selection unchanged, when the agent is absent from
    /// the latest snapshot or not installed. Unauthenticated agents are
    /// selected; the returned status reports `is_authenticated = false` so
    /// the caller can warn.
    pub fn switch_agent(&self, id: &str) -> Result<AgentStatus> {
        let status = {
            let mut state = self.write_state();
            let status = state
                .snapshot
                .iter()
                .find(|s| s.id() == id)
                .cloned()
                .ok_or_else(|| SpecPilotError::AgentNotFound(id.to_string()))?;
            if !status.is_available {
                return Err(SpecPilotError::AgentUnavailable(id.to_string()));
            }
            state.selected = Some(id.to_string());
            status
        };

        if !status.is_authenticated {
            tracing::warn!("{} is selected but not authenticated", status.name());
        }
        let _ = self.events.send(AgentEvent::SelectionChanged {
            agent: Some(id.to_string()),
        });
        Ok(status)
    }

    pub fn selected(&self) -> Option<AgentStatus> {
        self.read_state(|state| state.selected_status().cloned())
    }

    /// Whether the selected agent supports a capability; false when none is selected
    pub fn supports_feature(&self, capability: Capability) -> bool {
        self.read_state(|state| {
            state
                .selected_status()
                .map(|s| s.descriptor.supports(capability))
                .unwrap_or(false)
        })
    }

    /// Latest detection snapshot
    pub fn agents(&self) -> Arc<Vec<AgentStatus>> {
        self.read_state(|state| Arc::clone(&state.snapshot))
    }

    pub fn available_count(&self) -> usize {
        self.read_state(|state| state.snapshot.iter().filter(|s| s.is_available).count())
    }

    /// Agents that are both installed and logged in
    pub fn authenticated_agents(&self) -> Vec<AgentStatus> {
        self.read_state(|state| {
            state
                .snapshot
                .iter()
                .filter(|s| s.is_available && s.is_authenticated)
                .cloned()
                .collect()
        })
    }

    pub fn detector(&self) -> &AgentDetector {
        &self.detector
    }

    fn read_state<T>(&self, f: impl FnOnce(&ManagerState) -> T) -> T {
        let guard = self
            .state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, ManagerState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Preferred agent if available, then available and authenticated, then available
fn auto_select(statuses: &[AgentStatus], preferred: Option<&str>) -> Option<String> {
    if let Some(preferred) = preferred {
        if statuses
            .iter()
            .any(|s| s.id() == preferred && s.is_available)
        {
            return Some(preferred.to_string());
        }
    }

    statuses
        .iter()
        .find(|s| s.is_available && s.is_authenticated)
        .or_else(|| statuses.iter().find(|s| s.is_available))
        .map(|s| s.id().to_string())
}
