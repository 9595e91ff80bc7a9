//! Graceful-then-forced stop.

use crate::handle::ProcessHandle;
use std::time::Duration;
use tbs_common::SupervisorResult;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process was not alive when the stop began.
    AlreadyStopped,
    /// The process exited within the graceful window after SIGTERM.
    Terminated,
    /// The graceful window elapsed and SIGKILL was sent.
    ForceKilled,
}

impl StopOutcome {
    pub fn describe(&self) -> &'static str {
        match self {
            StopOutcome::AlreadyStopped => "already stopped",
            StopOutcome::Terminated => "stopped",
            StopOutcome::ForceKilled => "force killed",
        }
    }
}

/// Stop a process: SIGTERM, wait up to `graceful_wait`, then SIGKILL if it is
/// still alive.
///
/// The forced signal is sent once and not verified afterwards. The wait
/// returns early as soon as the process is gone.
pub async fn stop_process<H>(handle: &H, graceful_wait: Duration) -> SupervisorResult<StopOutcome>
where
    H: ProcessHandle + ?Sized,
{
    let pid = handle.pid();

    if !handle.is_alive()? {
        info!("Process {} is already stopped", pid);
        return Ok(StopOutcome::AlreadyStopped);
    }

    info!("Sending termination signal to PID {}", pid);
    if let Err(e) = handle.terminate() {
        // It may have exited between the check and the signal.
        if !handle.is_alive()? {
            debug!("PID {} exited before SIGTERM: {}", pid, e);
            return Ok(StopOutcome::Terminated);
        }
        warn!("Failed to send SIGTERM to PID {}: {}", pid, e);
    }

    if wait_for_exit(handle, graceful_wait).await? {
        info!("Process {} terminated gracefully", pid);
        return Ok(StopOutcome::Terminated);
    }

    warn!(
        "Process {} still alive after {:?}, sending SIGKILL",
        pid, graceful_wait
    );
    if let Err(e) = handle.kill() {
        warn!("Force kill of PID {} failed: {}", pid, e);
    }
    Ok(StopOutcome::ForceKilled)
}

/// Polls until the process is gone or `window` elapses.
///
/// Returns `Ok(true)` if exit was observed inside the window.
async fn wait_for_exit<H>(handle: &H, window: Duration) -> SupervisorResult<bool>
where
    H: ProcessHandle + ?Sized,
{
    let deadline = Instant::now() + window;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(!handle.is_alive()?);
        }
        sleep(EXIT_POLL_INTERVAL.min(deadline - now)).await;
        if !handle.is_alive()? {
            return Ok(true);
        }
    }
}
