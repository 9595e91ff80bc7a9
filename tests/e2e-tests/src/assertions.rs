//! Custom assertions for E2E tests

use crate::installation::{CtlOutput, Installation};
use crate::{pid_alive, wait_until};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tbs_process_file::PersistedState;

/// Assert that tradebotctl exited zero
pub fn assert_ctl_succeeded(output: &CtlOutput) -> Result<(), String> {
    if output.success() {
        Ok(())
    } else {
        Err(format!(
            "tradebotctl failed with {}.\nstdout:\n{}\nstderr:\n{}",
            output.status, output.stdout, output.stderr
        ))
    }
}

/// Assert that tradebotctl exited non-zero
pub fn assert_ctl_failed(output: &CtlOutput) -> Result<(), String> {
    if output.success() {
        Err(format!(
            "tradebotctl succeeded but failure was expected.\nstdout:\n{}",
            output.stdout
        ))
    } else {
        Ok(())
    }
}

/// Assert that tradebotctl's stdout contains a pattern
pub fn assert_stdout_contains(output: &CtlOutput, pattern: &str) -> Result<(), String> {
    if output.stdout.contains(pattern) {
        Ok(())
    } else {
        Err(format!(
            "stdout does not contain '{}'. stdout:\n{}",
            pattern, output.stdout
        ))
    }
}

/// Assert that tradebotctl's stderr contains a pattern
pub fn assert_stderr_contains(output: &CtlOutput, pattern: &str) -> Result<(), String> {
    if output.stderr.contains(pattern) {
        Ok(())
    } else {
        Err(format!(
            "stderr does not contain '{}'. stderr:\n{}",
            pattern, output.stderr
        ))
    }
}

/// Assert that the state file exists with exactly the two PID keys, and
/// return its parsed contents
pub fn assert_state_file_written(install: &Installation) -> Result<PersistedState, String> {
    let path = install.state_file();
    let content = fs::read_to_string(&path)
        .map_err(|e| format!("State file {} not readable: {}", path.display(), e))?;

    let mut keys: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once('=').map(|(key, _)| key.trim()))
        .collect();
    keys.sort_unstable();
    if keys != ["BACKEND_PID", "FRONTEND_PID"] {
        return Err(format!("Unexpected state file keys {:?}. Content:\n{}", keys, content));
    }

    PersistedState::parse(&path, &content).map_err(|e| e.to_string())
}

/// Assert that no state file exists
pub fn assert_no_state_file(install: &Installation) -> Result<(), String> {
    let path = install.state_file();
    if path.exists() {
        Err(format!(
            "State file {} exists:\n{}",
            path.display(),
            fs::read_to_string(&path).unwrap_or_default()
        ))
    } else {
        Ok(())
    }
}

/// Assert that a process is running
pub fn assert_pid_alive(pid: u32) -> Result<(), String> {
    if pid_alive(pid) {
        Ok(())
    } else {
        Err(format!("PID {} is not running", pid))
    }
}

/// Assert that a process is gone, allowing a short grace period
pub fn assert_pid_gone(pid: u32) -> Result<(), String> {
    if wait_until(Duration::from_secs(5), || !pid_alive(pid)) {
        Ok(())
    } else {
        Err(format!("PID {} is still running", pid))
    }
}

/// Assert that a log file exists and contains expected content
pub fn assert_log_file_contains(file_path: &Path, pattern: &str) -> Result<(), String> {
    if !file_path.exists() {
        return Err(format!("Log file does not exist: {}", file_path.display()));
    }

    let content = fs::read_to_string(file_path)
        .map_err(|e| format!("Failed to read log file: {}", e))?;

    if content.contains(pattern) {
        Ok(())
    } else {
        Err(format!(
            "Log file {} does not contain pattern '{}'. Content:\n{}",
            file_path.display(),
            pattern,
            content
        ))
    }
}

/// Assert that a log file was never created
pub fn assert_log_file_absent(file_path: &Path) -> Result<(), String> {
    if file_path.exists() {
        Err(format!("Log file should not exist: {}", file_path.display()))
    } else {
        Ok(())
    }
}
