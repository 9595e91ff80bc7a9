//! Tear-down sequence.
//!
//! Guided mode stops the PIDs recorded by the last successful bring-up and
//! removes the state file. Discovery mode, used when there is no state file,
//! stops whatever listens on the backend port and the frontend range. Both
//! go through the same [`stop_process`] path.
//!
//! Recorded PIDs lead the process groups `launch` created, so guided mode
//! signals the whole group. Discovery signals only the listening PID.

use crate::Supervisor;
use std::time::Duration;
use tbs_common::{Role, SupervisorResult};
use tbs_process::{listener_pids, stop_process, PidHandle, ProcessHandle, StopOutcome};
use tbs_process_file::PersistedState;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TearDownMode {
    Guided,
    Discovery,
}

impl TearDownMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TearDownMode::Guided => "guided",
            TearDownMode::Discovery => "discovery",
        }
    }
}

/// What happened to one process. `pid` is `None` when discovery found
/// nothing for the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleStop {
    pub role: Role,
    pub pid: Option<u32>,
    pub outcome: StopOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TearDownReport {
    pub mode: TearDownMode,
    pub stops: Vec<RoleStop>,
    pub state_file_removed: bool,
}

impl TearDownReport {
    /// True when nothing was running.
    pub fn all_already_stopped(&self) -> bool {
        self.stops
            .iter()
            .all(|stop| stop.outcome == StopOutcome::AlreadyStopped)
    }
}

impl Supervisor {
    /// Stop both services.
    ///
    /// Stopping something that is not running is reported, never an error,
    /// so tear-down can be repeated safely.
    pub async fn tear_down(&self) -> SupervisorResult<TearDownReport> {
        let state_file = &self.paths.state_file;

        match PersistedState::load(state_file).await {
            Ok(Some(state)) => self.guided_tear_down(state).await,
            Ok(None) => {
                info!(
                    "No state file at {}, discovering processes by port",
                    state_file.display()
                );
                self.discovery_tear_down().await
            }
            Err(e) => {
                warn!("Ignoring unreadable state file: {}", e);
                let mut report = self.discovery_tear_down().await?;
                PersistedState::delete(state_file).await?;
                report.state_file_removed = true;
                Ok(report)
            }
        }
    }

    async fn guided_tear_down(&self, state: PersistedState) -> SupervisorResult<TearDownReport> {
        info!("Stopping services recorded in {}", self.paths.state_file.display());

        let mut stops = Vec::new();
        for (role, pid) in state.entries() {
            let handle = PidHandle::group_leader(pid);
            let outcome = stop_role(role, &handle, self.config.graceful_wait(role)).await?;
            stops.push(RoleStop {
                role,
                pid: Some(pid),
                outcome,
            });
        }

        PersistedState::delete(&self.paths.state_file).await?;

        Ok(TearDownReport {
            mode: TearDownMode::Guided,
            stops,
            state_file_removed: true,
        })
    }

    async fn discovery_tear_down(&self) -> SupervisorResult<TearDownReport> {
        let graceful_wait = self.config.discovery_graceful_wait();
        let mut stops = Vec::new();

        for role in Role::ALL {
            let range = self.config.port_range(role);
            let pids: Vec<u32> = listener_pids(range)?
                .into_iter()
                .filter(|pid| *pid != std::process::id())
                .collect();

            if pids.is_empty() {
                info!("No {} process listening on {}; already stopped", role, range);
                stops.push(RoleStop {
                    role,
                    pid: None,
                    outcome: StopOutcome::AlreadyStopped,
                });
                continue;
            }

            for pid in pids {
                info!("Found {} (PID: {}) listening on {}", role, pid, range);
                let outcome = stop_role(role, &PidHandle::new(pid), graceful_wait).await?;
                stops.push(RoleStop {
                    role,
                    pid: Some(pid),
                    outcome,
                });
            }
        }

        Ok(TearDownReport {
            mode: TearDownMode::Discovery,
            stops,
            state_file_removed: false,
        })
    }
}

async fn stop_role(role: Role, handle: &PidHandle, graceful_wait: Duration) -> SupervisorResult<StopOutcome> {
    let pid = handle.pid();
    let outcome = stop_process(handle, graceful_wait).await?;
    match outcome {
        StopOutcome::AlreadyStopped => info!("{} (PID: {}) already stopped", role, pid),
        StopOutcome::Terminated => info!("{} (PID: {}) stopped", role, pid),
        StopOutcome::ForceKilled => warn!("{} (PID: {}) force killed", role, pid),
    }
    Ok(outcome)
}
