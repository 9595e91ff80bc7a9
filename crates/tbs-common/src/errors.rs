//! Error types for the supervisor.
//!
//! Fatal bring-up conditions (`LaunchFailed`, `HealthTimeout`) carry the tail
//! of the role's captured log so the operator sees why the process died
//! without opening the file. Soft conditions (readiness timeout, already
//! stopped) are not errors and never appear here.

use crate::types::Role;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for supervisor operations.
pub type SupervisorResult<T> = std::result::Result<T, SupervisorError>;

/// Main error type for supervisor operations.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("{role} launch failed: {reason}")]
    LaunchFailed {
        role: Role,
        reason: String,
        log_tail: Vec<String>,
    },

    #[error("{role} spawn failed: {reason}")]
    SpawnFailed { role: Role, reason: String },

    #[error("{role} health check failed after {attempts} attempts")]
    HealthTimeout {
        role: Role,
        attempts: u32,
        log_tail: Vec<String>,
    },

    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("Failed to check process {pid}: {reason}")]
    ProcessCheck { pid: u32, reason: String },

    #[error("Port scan failed: {reason}")]
    PortScan { reason: String },

    #[error("State file error ({}): {reason}", path.display())]
    StateFile { path: PathBuf, reason: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("Invalid bring-up transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    pub fn launch_failed(role: Role, reason: impl Into<String>, log_tail: Vec<String>) -> Self {
        Self::LaunchFailed {
            role,
            reason: reason.into(),
            log_tail,
        }
    }

    pub fn spawn_failed(role: Role, reason: impl Into<String>) -> Self {
        Self::SpawnFailed {
            role,
            reason: reason.into(),
        }
    }

    pub fn health_timeout(role: Role, attempts: u32, log_tail: Vec<String>) -> Self {
        Self::HealthTimeout {
            role,
            attempts,
            log_tail,
        }
    }

    pub fn signal(pid: u32, reason: impl Into<String>) -> Self {
        Self::Signal {
            pid,
            reason: reason.into(),
        }
    }

    pub fn process_check(pid: u32, reason: impl Into<String>) -> Self {
        Self::ProcessCheck {
            pid,
            reason: reason.into(),
        }
    }

    pub fn port_scan(reason: impl Into<String>) -> Self {
        Self::PortScan {
            reason: reason.into(),
        }
    }

    pub fn state_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StateFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Captured log lines attached to a fatal bring-up error, if any.
    pub fn log_tail(&self) -> &[String] {
        match self {
            Self::LaunchFailed { log_tail, .. } | Self::HealthTimeout { log_tail, .. } => log_tail,
            _ => &[],
        }
    }

    /// The role a failure is attributed to, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::LaunchFailed { role, .. }
            | Self::SpawnFailed { role, .. }
            | Self::HealthTimeout { role, .. } => Some(*role),
            _ => None,
        }
    }
}
