//! Bring-up sequence.
//!
//! ```text
//! Idle -> PortsCleared -> BackendLaunched -> BackendHealthy
//!      -> FrontendLaunched -> FrontendReady -> Persisted -> Running
//! ```
//!
//! A fatal failure stops the sequence where it is. Processes already
//! launched keep running and nothing is persisted; the operator runs
//! tear-down, which falls back to discovery.

use crate::managed_process::ManagedProcess;
use crate::reclaim::reclaim_ports;
use crate::state::{BringUpMachine, BringUpState, StateTransition};
use crate::Supervisor;
use serde::Serialize;
use tbs_common::{Role, SupervisorError, SupervisorResult};
use tbs_monitoring::{poll_until, HttpHealthProbe, ReadinessScanner, ReadinessSignal, WaitOutcome};
use tbs_process::{launch, process_exists};
use tbs_process_file::PersistedState;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Result of a successful bring-up.
#[derive(Debug, Clone, Serialize)]
pub struct BringUpReport {
    pub backend: ManagedProcess,
    pub frontend: ManagedProcess,
    pub backend_url: String,
    pub frontend_url: String,
    /// False when the readiness marker never appeared and the default port
    /// was assumed.
    pub frontend_ready: bool,
    /// Stale occupants killed to free the ports.
    pub reclaimed_pids: Vec<u32>,
    pub history: Vec<StateTransition>,
}

impl Supervisor {
    /// Run the full bring-up sequence.
    pub async fn bring_up(&self) -> SupervisorResult<BringUpReport> {
        let mut machine = BringUpMachine::new();

        let result = self.run_bring_up(&mut machine).await;
        if let Err(ref e) = result {
            error!(
                "Bring-up aborted in state {}: {}",
                machine.current_state(),
                e
            );
            for transition in machine.history() {
                debug!(
                    "  {} -> {}: {}",
                    transition.from_state,
                    transition.to_state,
                    transition.reason.as_deref().unwrap_or("")
                );
            }
        }
        result.map(|mut report| {
            report.history = machine.into_history();
            report
        })
    }

    async fn run_bring_up(&self, machine: &mut BringUpMachine) -> SupervisorResult<BringUpReport> {
        let config = &self.config;
        let mut reclaimed_pids = Vec::new();

        // Backend
        let backend_range = config.port_range(Role::Backend);
        reclaimed_pids.extend(reclaim_ports(Role::Backend, backend_range).await);
        machine.transition_to(BringUpState::PortsCleared, format!("port {} free", backend_range))?;

        let backend = self.launch_and_confirm(Role::Backend, machine).await?;
        self.wait_for_backend_health(&backend, machine).await?;

        // Frontend
        let frontend_range = config.port_range(Role::Frontend);
        reclaimed_pids.extend(reclaim_ports(Role::Frontend, frontend_range).await);

        let mut frontend = self.launch_and_confirm(Role::Frontend, machine).await?;
        let frontend_ready = self.wait_for_frontend_ready(&mut frontend, machine).await?;

        // Only live PIDs are recorded
        self.confirm_still_running(&backend, machine)?;
        self.confirm_still_running(&frontend, machine)?;

        // Persist
        PersistedState::new(backend.pid, frontend.pid)
            .save(&self.paths.state_file)
            .await?;
        machine.transition_to(
            BringUpState::Persisted,
            format!("saved {}", self.paths.state_file.display()),
        )?;

        let backend_url = backend.url(&config.backend.url_path);
        let frontend_url = frontend.url("");
        machine.transition_to(BringUpState::Running, "all services up")?;

        info!("Backend running (PID: {}) at {}", backend.pid, backend_url);
        info!("Frontend running (PID: {}) at {}", frontend.pid, frontend_url);

        Ok(BringUpReport {
            backend,
            frontend,
            backend_url,
            frontend_url,
            frontend_ready,
            reclaimed_pids,
            history: Vec::new(),
        })
    }

    /// Launch a role, wait its launch delay, and confirm it is still alive.
    async fn launch_and_confirm(
        &self,
        role: Role,
        machine: &mut BringUpMachine,
    ) -> SupervisorResult<ManagedProcess> {
        let launched_state = match role {
            Role::Backend => BringUpState::BackendLaunched,
            Role::Frontend => BringUpState::FrontendLaunched,
        };
        let failed_state = launch_failed_state(role);

        let log = self.role_log(role);
        let command = self.config.launch_command(role, &self.paths);
        info!("Starting {}: {}", role, command.display());

        let spawned = log.create_truncated().and_then(|file| launch(&command, file));
        let mut launched = match spawned {
            Ok(launched) => launched,
            Err(e) => {
                let err = SupervisorError::launch_failed(role, e.to_string(), self.log_tail(role));
                return Err(fail(machine, failed_state, err));
            }
        };
        machine.transition_to(launched_state, format!("PID {}", launched.pid))?;

        let delay = self.config.launch_delay(role);
        sleep(delay).await;

        if !launched.is_alive()? {
            let err = SupervisorError::launch_failed(
                role,
                format!("PID {} was not running {:?} after launch", launched.pid, delay),
                self.log_tail(role),
            );
            return Err(fail(machine, failed_state, err));
        }

        info!("{} started (PID: {})", role, launched.pid);
        Ok(ManagedProcess::new(
            role,
            launched.pid,
            self.config.default_port(role),
            log.path(),
        ))
    }

    /// Poll the health endpoint. Running out of attempts is fatal.
    async fn wait_for_backend_health(
        &self,
        backend: &ManagedProcess,
        machine: &mut BringUpMachine,
    ) -> SupervisorResult<()> {
        let health = &self.config.backend.health_check;
        let probe = HttpHealthProbe::localhost(
            backend.port,
            &self.config.backend.health_path,
            health.request_timeout,
        )
        .map_err(|e| SupervisorError::configuration(e.to_string()))?;

        let budget = self.config.health_budget();
        info!(
            "Waiting for backend health at {} ({} attempts, {:?} apart)",
            probe.endpoint(),
            budget.attempts,
            budget.interval
        );

        let probe = &probe;
        let outcome = poll_until("backend health", budget, |attempt| async move {
            let data = probe
                .check()
                .await
                .map_err(|e| SupervisorError::configuration(e.to_string()))?;
            if !data.is_healthy {
                debug!(
                    "Backend not healthy yet (attempt {}): {}",
                    attempt,
                    data.error_message.as_deref().unwrap_or("no response")
                );
            }
            Ok::<_, SupervisorError>(data.is_healthy.then_some(data))
        })
        .await?;

        match outcome {
            WaitOutcome::Satisfied { attempt, value } => {
                machine.transition_to(
                    BringUpState::BackendHealthy,
                    format!(
                        "HTTP {} on attempt {}",
                        value.status_code.unwrap_or_default(),
                        attempt
                    ),
                )?;
                info!("Backend is healthy");
                Ok(())
            }
            WaitOutcome::Exhausted { attempts, .. } => {
                let err = SupervisorError::health_timeout(Role::Backend, attempts, self.log_tail(Role::Backend));
                Err(fail(machine, BringUpState::BackendUnhealthy, err))
            }
        }
    }

    /// Scan the frontend log for readiness and record the bound port.
    ///
    /// Never fatal: without the marker, or without a local URL shortly
    /// after it, the default port is assumed.
    async fn wait_for_frontend_ready(
        &self,
        frontend: &mut ManagedProcess,
        machine: &mut BringUpMachine,
    ) -> SupervisorResult<bool> {
        let fe = &self.config.frontend;
        let scanner = ReadinessScanner::new(fe.ready_marker.as_str(), fe.local_marker.as_str())
            .map_err(|e| SupervisorError::configuration(e.to_string()))?;
        let log = self.role_log(Role::Frontend);
        let default_port = self.config.default_port(Role::Frontend);

        let mut marker_seen_at = None;
        let outcome = poll_until("frontend readiness", self.config.readiness_budget(), |attempt| {
            let scanned = log
                .read_lines()
                .map(|lines| hold_for_local_url(scanner.scan(lines.as_slice()), attempt, &mut marker_seen_at));
            async move { scanned }
        })
        .await?;

        let (port, ready, reason) = match outcome {
            WaitOutcome::Satisfied { value, .. } => match value.port {
                Some(port) => (port, true, format!("ready on port {}", port)),
                None => {
                    warn!(
                        "Frontend is ready but reported no local URL; assuming port {}",
                        default_port
                    );
                    (default_port, true, format!("ready, assumed port {}", default_port))
                }
            },
            WaitOutcome::Exhausted { .. } if marker_seen_at.is_some() => {
                warn!(
                    "Frontend is ready but reported no local URL; assuming port {}",
                    default_port
                );
                (default_port, true, format!("ready, assumed port {}", default_port))
            }
            WaitOutcome::Exhausted { attempts, .. } => {
                warn!(
                    "Frontend did not log '{}' within {} checks; assuming port {}",
                    fe.ready_marker, attempts, default_port
                );
                (default_port, false, format!("readiness timed out, assumed port {}", default_port))
            }
        };

        frontend.record_port(port);
        machine.transition_to(BringUpState::FrontendReady, reason)?;
        Ok(ready)
    }

    /// Fail the role if its process has exited since it was confirmed.
    fn confirm_still_running(
        &self,
        process: &ManagedProcess,
        machine: &mut BringUpMachine,
    ) -> SupervisorResult<()> {
        if process_exists(process.pid)? {
            return Ok(());
        }

        let err = SupervisorError::launch_failed(
            process.role,
            format!("PID {} exited before it could be recorded", process.pid),
            self.log_tail(process.role),
        );
        Err(fail(machine, launch_failed_state(process.role), err))
    }
}

/// Checks a dev server gets to print its local URL after the ready marker.
const LOCAL_URL_GRACE_ATTEMPTS: u32 = 5;

/// Hold back a marker-only signal until the local URL shows up or the
/// grace checks run out.
fn hold_for_local_url(
    signal: Option<ReadinessSignal>,
    attempt: u32,
    marker_seen_at: &mut Option<u32>,
) -> Option<ReadinessSignal> {
    match signal {
        Some(ReadinessSignal { port: None }) => {
            let first = *marker_seen_at.get_or_insert(attempt);
            (attempt - first >= LOCAL_URL_GRACE_ATTEMPTS).then_some(ReadinessSignal { port: None })
        }
        other => other,
    }
}

fn launch_failed_state(role: Role) -> BringUpState {
    match role {
        Role::Backend => BringUpState::BackendLaunchFailed,
        Role::Frontend => BringUpState::FrontendLaunchFailed,
    }
}

/// Record a failure state and hand the error back.
fn fail(machine: &mut BringUpMachine, state: BringUpState, err: SupervisorError) -> SupervisorError {
    if let Err(e) = machine.transition_to(state, err.to_string()) {
        warn!("{}", e);
    }
    err
}
