//! # TBS Supervisor
//!
//! Lifecycle supervisor for the trading bot's two services.
//!
//! - [`Supervisor::bring_up`]: reclaim ports, launch the backend, wait for
//!   its health endpoint, launch the frontend, wait for its readiness
//!   marker, persist both PIDs, report the access URLs.
//! - [`Supervisor::tear_down`]: stop both processes, from the state file
//!   when present (guided) or by port scan when not (discovery).
//! - [`Supervisor::status`] and [`Supervisor::restart`].
//!
//! Everything runs as one sequential flow. Children are left running when
//! the supervisor exits; the state file is the only handoff to the next
//! invocation.

pub mod bring_up;
pub mod config;
pub mod managed_process;
pub mod reclaim;
pub mod state;
pub mod status;
pub mod tear_down;

pub use bring_up::BringUpReport;
pub use config::{ResolvedPaths, SupervisorConfig};
pub use managed_process::ManagedProcess;
pub use state::{BringUpMachine, BringUpState, StateTransition};
pub use status::{PortListener, RoleStatus, StatusReport};
pub use tear_down::{RoleStop, TearDownMode, TearDownReport};

use std::path::Path;
use tbs_common::{Role, SupervisorResult};
use tbs_log_collection::RoleLog;

/// Supervisor bound to one installation root.
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: SupervisorConfig,
    paths: ResolvedPaths,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, root: impl AsRef<Path>) -> Self {
        let paths = config.resolve(root);
        Self { config, paths }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    pub fn role_log(&self, role: Role) -> RoleLog {
        RoleLog::new(&self.paths.log_dir, role)
    }

    /// Last lines of a role's captured output.
    pub fn log_tail(&self, role: Role) -> Vec<String> {
        self.role_log(role).tail(self.config.supervisor.log_tail_lines)
    }

    /// Tear down whatever is running, then bring everything up again.
    pub async fn restart(&self) -> SupervisorResult<(TearDownReport, BringUpReport)> {
        let stopped = self.tear_down().await?;
        let started = self.bring_up().await?;
        Ok((stopped, started))
    }
}
