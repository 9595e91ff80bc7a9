//! Bring-up state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tbs_common::{SupervisorError, SupervisorResult};
use tracing::debug;

/// Position in the bring-up sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BringUpState {
    Idle,
    PortsCleared,
    BackendLaunched,
    BackendHealthy,
    FrontendLaunched,
    FrontendReady,
    Persisted,
    Running,
    BackendLaunchFailed,
    BackendUnhealthy,
    FrontendLaunchFailed,
}

impl fmt::Display for BringUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BringUpState::Idle => "idle",
            BringUpState::PortsCleared => "ports_cleared",
            BringUpState::BackendLaunched => "backend_launched",
            BringUpState::BackendHealthy => "backend_healthy",
            BringUpState::FrontendLaunched => "frontend_launched",
            BringUpState::FrontendReady => "frontend_ready",
            BringUpState::Persisted => "persisted",
            BringUpState::Running => "running",
            BringUpState::BackendLaunchFailed => "backend_launch_failed",
            BringUpState::BackendUnhealthy => "backend_unhealthy",
            BringUpState::FrontendLaunchFailed => "frontend_launch_failed",
        };
        f.write_str(name)
    }
}

impl BringUpState {
    /// Failure states end the sequence with a nonzero exit.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            BringUpState::BackendLaunchFailed
                | BringUpState::BackendUnhealthy
                | BringUpState::FrontendLaunchFailed
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.is_failure() || *self == BringUpState::Running
    }
}

/// Represents a state transition with timestamp and optional reason
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub from_state: BringUpState,
    pub to_state: BringUpState,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Strictly sequential bring-up tracker.
///
/// There is exactly one forward path. The launch states may instead move to
/// their failure state; spawn errors fail the role before it reaches its
/// launched state. A process found dead after `FrontendReady` fails its
/// role's launch, since nothing may be persisted for it.
#[derive(Debug, Clone)]
pub struct BringUpMachine {
    current_state: BringUpState,
    history: Vec<StateTransition>,
}

impl Default for BringUpMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl BringUpMachine {
    pub fn new() -> Self {
        Self {
            current_state: BringUpState::Idle,
            history: Vec::new(),
        }
    }

    pub fn current_state(&self) -> BringUpState {
        self.current_state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn into_history(self) -> Vec<StateTransition> {
        self.history
    }

    pub fn is_valid_transition(&self, target: BringUpState) -> bool {
        use BringUpState::*;

        matches!(
            (self.current_state, target),
            (Idle, PortsCleared)
                | (PortsCleared, BackendLaunched)
                | (PortsCleared, BackendLaunchFailed)
                | (BackendLaunched, BackendHealthy)
                | (BackendLaunched, BackendLaunchFailed)
                | (BackendLaunched, BackendUnhealthy)
                | (BackendHealthy, FrontendLaunched)
                | (BackendHealthy, FrontendLaunchFailed)
                | (FrontendLaunched, FrontendReady)
                | (FrontendLaunched, FrontendLaunchFailed)
                | (FrontendReady, Persisted)
                | (FrontendReady, BackendLaunchFailed)
                | (FrontendReady, FrontendLaunchFailed)
                | (Persisted, Running)
        )
    }

    /// Move to `target`, recording the transition.
    pub fn transition_to(&mut self, target: BringUpState, reason: impl Into<String>) -> SupervisorResult<()> {
        if !self.is_valid_transition(target) {
            return Err(SupervisorError::InvalidTransition {
                from: self.current_state.to_string(),
                to: target.to_string(),
            });
        }

        let reason = reason.into();
        debug!("Bring-up: {} -> {} ({})", self.current_state, target, reason);

        self.history.push(StateTransition {
            from_state: self.current_state,
            to_state: target,
            timestamp: Utc::now(),
            reason: Some(reason),
        });
        self.current_state = target;
        Ok(())
    }
}
