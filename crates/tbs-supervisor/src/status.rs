//! Status reporting.
//!
//! Read-only: combines the state file, PID liveness and a port scan. Down
//! services are a normal answer, not an error.

use crate::Supervisor;
use serde::Serialize;
use std::path::PathBuf;
use tbs_common::{Role, SupervisorResult};
use tbs_process::{find_listeners, process_exists};
use tbs_process_file::PersistedState;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortListener {
    pub port: u16,
    pub pid: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleStatus {
    pub role: Role,
    /// Port or range the role is configured for, e.g. `5173-5179`.
    pub ports: String,
    /// PID from the state file, if there is one.
    pub pid: Option<u32>,
    pub alive: bool,
    pub listeners: Vec<PortListener>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub state_file: PathBuf,
    pub state_file_present: bool,
    pub roles: Vec<RoleStatus>,
}

impl StatusReport {
    /// Both recorded processes are alive.
    pub fn is_running(&self) -> bool {
        self.state_file_present && self.roles.iter().all(|r| r.alive)
    }

    pub fn role(&self, role: Role) -> Option<&RoleStatus> {
        self.roles.iter().find(|r| r.role == role)
    }
}

impl Supervisor {
    pub async fn status(&self) -> SupervisorResult<StatusReport> {
        let state = match PersistedState::load(&self.paths.state_file).await {
            Ok(state) => state,
            Err(e) => {
                warn!("{}", e);
                None
            }
        };

        let mut roles = Vec::new();
        for role in Role::ALL {
            let range = self.config.port_range(role);
            let pid = state.map(|s| s.pid(role));

            let alive = match pid.map(process_exists).transpose() {
                Ok(alive) => alive.unwrap_or(false),
                Err(e) => {
                    warn!("{}", e);
                    false
                }
            };

            let listeners = match find_listeners(range) {
                Ok(occupants) => occupants
                    .into_iter()
                    .map(|o| PortListener {
                        port: o.port,
                        pid: o.pid,
                    })
                    .collect(),
                Err(e) => {
                    warn!("{}", e);
                    Vec::new()
                }
            };

            roles.push(RoleStatus {
                role,
                ports: range.to_string(),
                pid,
                alive,
                listeners,
            });
        }

        Ok(StatusReport {
            state_file: self.paths.state_file.clone(),
            state_file_present: state.is_some(),
            roles,
        })
    }
}
