//! Process termination primitives.

use crate::check::to_raw_pid;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::{getpgid, Pid};
use tbs_common::{SupervisorError, SupervisorResult};

/// Terminate a process gracefully (SIGTERM).
pub fn terminate_gracefully(pid: u32) -> SupervisorResult<()> {
    send_signal(pid, Signal::SIGTERM)
}

/// Force kill a process (SIGKILL).
pub fn force_kill(pid: u32) -> SupervisorResult<()> {
    send_signal(pid, Signal::SIGKILL)
}

/// Terminate every process in a group gracefully (SIGTERM).
pub fn terminate_group_gracefully(pgid: u32) -> SupervisorResult<()> {
    send_group_signal(pgid, Signal::SIGTERM)
}

/// Force kill every process in a group (SIGKILL).
pub fn force_kill_group(pgid: u32) -> SupervisorResult<()> {
    send_group_signal(pgid, Signal::SIGKILL)
}

/// True when `pid` leads its own process group, as launched children do.
pub fn is_group_leader(pid: u32) -> bool {
    let Some(raw) = to_raw_pid(pid) else {
        return false;
    };
    let pid = Pid::from_raw(raw);
    matches!(getpgid(Some(pid)), Ok(pgid) if pgid == pid)
}

fn send_group_signal(pgid: u32, signal: Signal) -> SupervisorResult<()> {
    let raw = to_raw_pid(pgid)
        .ok_or_else(|| SupervisorError::signal(pgid, "not a valid process group"))?;

    killpg(Pid::from_raw(raw), signal)
        .map_err(|e| SupervisorError::signal(pgid, format!("{} to group: {}", signal, e)))
}

fn send_signal(pid: u32, signal: Signal) -> SupervisorResult<()> {
    let raw = to_raw_pid(pid)
        .ok_or_else(|| SupervisorError::signal(pid, "not a valid single-process PID"))?;

    kill(Pid::from_raw(raw), signal)
        .map_err(|e| SupervisorError::signal(pid, format!("{}: {}", signal, e)))
}
