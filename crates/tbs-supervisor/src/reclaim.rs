//! Port reclamation before launch.
//!
//! A port still held at bring-up time is assumed to belong to a previous,
//! possibly crashed, run. Its owner is killed outright: no graceful phase.

use std::time::Duration;
use tbs_common::{PortRange, Role, SupervisorResult};
use tbs_monitoring::{poll_until, WaitBudget};
use tbs_process::{find_listeners, PidHandle, ProcessHandle};
use tracing::{debug, info, warn};

/// How long to wait for a killed occupant to disappear.
const RELEASE_BUDGET: WaitBudget = WaitBudget {
    attempts: 20,
    interval: Duration::from_millis(50),
    policy: tbs_monitoring::TimeoutPolicy::Soft,
};

/// Kill every process listening in `range`. Returns the PIDs killed.
///
/// Nothing listening is the normal case and is silent. Scan and kill
/// failures are warnings: a port that stays busy shows up as a launch
/// failure of the role.
pub async fn reclaim_ports(role: Role, range: PortRange) -> Vec<u32> {
    let occupants = match find_listeners(range) {
        Ok(occupants) => occupants,
        Err(e) => {
            warn!("Could not scan {} port(s) {}: {}", role, range, e);
            return Vec::new();
        }
    };

    let mut killed = Vec::new();
    for occupant in occupants {
        let Some(pid) = occupant.pid else {
            warn!(
                "Port {} is held by a process that cannot be identified; leaving it",
                occupant.port
            );
            continue;
        };
        if pid == std::process::id() || killed.contains(&pid) {
            continue;
        }

        info!("Killing PID {} holding {} port {}", pid, role, occupant.port);
        let handle = PidHandle::new(pid);
        match handle.kill() {
            Ok(()) => {
                if let Err(e) = wait_until_gone(&handle).await {
                    debug!("Could not confirm PID {} exited: {}", pid, e);
                }
                killed.push(pid);
            }
            Err(e) => warn!("Failed to kill PID {} on port {}: {}", pid, occupant.port, e),
        }
    }
    killed
}

async fn wait_until_gone(handle: &PidHandle) -> SupervisorResult<()> {
    let outcome = poll_until("port release", RELEASE_BUDGET, |_| async move {
        Ok::<_, tbs_common::SupervisorError>((!handle.is_alive()?).then_some(()))
    })
    .await?;

    if !outcome.is_satisfied() {
        warn!("PID {} still present after SIGKILL", handle.pid());
    }
    Ok(())
}
