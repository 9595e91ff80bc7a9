//! Process existence checking.

use tbs_common::{SupervisorError, SupervisorResult};

/// Check if a process with the given PID exists and is running.
///
/// Uses `kill(pid, 0)`, which sends no signal but reports whether the
/// process exists. A process we are not allowed to signal (`EPERM`) still
/// exists. On Linux a zombie (exited, not yet reaped) is reported as not
/// running, because signalling it succeeds even though it is stopped.
///
/// PID 0 and values outside the `pid_t` range never name a single process
/// and are reported as not existing.
///
/// # Returns
///
/// * `Ok(true)` - Process exists and is running
/// * `Ok(false)` - Process does not exist (or is a zombie)
/// * `Err(_)` - The check itself failed
///
/// # Examples
///
/// ```rust,no_run
/// use tbs_process::process_exists;
///
/// if process_exists(1234).unwrap() {
///     println!("Process 1234 is running");
/// }
/// ```
pub fn process_exists(pid: u32) -> SupervisorResult<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Some(raw) = to_raw_pid(pid) else {
        return Ok(false);
    };

    match kill(Pid::from_raw(raw), None) {
        Ok(_) => Ok(!is_zombie(pid)),
        Err(Errno::ESRCH) => Ok(false),
        Err(Errno::EPERM) => Ok(true),
        Err(e) => Err(SupervisorError::process_check(pid, e.to_string())),
    }
}

/// Converts a PID to a `pid_t` that addresses exactly one process.
pub(crate) fn to_raw_pid(pid: u32) -> Option<i32> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Some(raw),
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn is_zombie(pid: u32) -> bool {
    let Some(raw) = to_raw_pid(pid) else {
        return false;
    };
    match procfs::process::Process::new(raw).and_then(|process| process.stat()) {
        Ok(stat) => stat.state == 'Z',
        Err(_) => false,
    }
}

#[cfg(not(target_os = "linux"))]
fn is_zombie(_pid: u32) -> bool {
    false
}
