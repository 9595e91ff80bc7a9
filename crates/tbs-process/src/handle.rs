//! The process handle seam.
//!
//! A supervised process is only ever known to us by its PID. Guided
//! tear-down, discovery tear-down and port reclamation all go through this
//! trait so they share one termination path.

use crate::check::process_exists;
use crate::terminate::{
    force_kill, force_kill_group, is_group_leader, terminate_gracefully, terminate_group_gracefully,
};
use tbs_common::SupervisorResult;

/// PID plus liveness check plus graceful/forced signal.
pub trait ProcessHandle: Send + Sync {
    fn pid(&self) -> u32;

    fn is_alive(&self) -> SupervisorResult<bool>;

    /// Ask the process to stop (SIGTERM).
    fn terminate(&self) -> SupervisorResult<()>;

    /// Stop the process unconditionally (SIGKILL).
    fn kill(&self) -> SupervisorResult<()>;
}

/// Handle to an OS process addressed by PID.
///
/// Liveness always follows the PID itself. A group handle sends its
/// signals to the whole process group while the PID still leads one, so
/// helpers the service forked (reloaders, workers) stop with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidHandle {
    pid: u32,
    signal_group: bool,
}

impl PidHandle {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            signal_group: false,
        }
    }

    /// Handle for a process started in its own group by `launch`.
    pub fn group_leader(pid: u32) -> Self {
        Self {
            pid,
            signal_group: true,
        }
    }

    fn signals_group(&self) -> bool {
        self.signal_group && is_group_leader(self.pid)
    }
}

impl ProcessHandle for PidHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> SupervisorResult<bool> {
        process_exists(self.pid)
    }

    fn terminate(&self) -> SupervisorResult<()> {
        if self.signals_group() {
            terminate_group_gracefully(self.pid)
        } else {
            terminate_gracefully(self.pid)
        }
    }

    fn kill(&self) -> SupervisorResult<()> {
        if self.signals_group() {
            force_kill_group(self.pid)
        } else {
            force_kill(self.pid)
        }
    }
}
