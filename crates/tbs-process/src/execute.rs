//! Background process launch.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use tbs_common::{Role, SupervisorError, SupervisorResult};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Everything needed to start one role's process.
#[derive(Debug, Clone)]
pub struct LaunchCommand {
    pub role: Role,
    pub program: String,
    pub args: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub environment: BTreeMap<String, String>,
}

impl LaunchCommand {
    pub fn new(role: Role, program: impl Into<String>) -> Self {
        Self {
            role,
            program: program.into(),
            args: Vec::new(),
            working_directory: None,
            environment: BTreeMap::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A launched process: its PID and the child handle.
///
/// The child is not killed on drop; it keeps running after the supervisor
/// exits.
#[derive(Debug)]
pub struct LaunchedProcess {
    pub role: Role,
    pub pid: u32,
    child: Child,
}

impl LaunchedProcess {
    /// Whether the launched process is still running.
    ///
    /// Reaps the child if it has exited, then falls back to the PID probe.
    pub fn is_alive(&mut self) -> SupervisorResult<bool> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!("{} (PID: {}) exited with {}", self.role, self.pid, status);
                Ok(false)
            }
            Ok(None) => crate::check::process_exists(self.pid),
            Err(e) => Err(SupervisorError::process_check(self.pid, e.to_string())),
        }
    }
}

/// Start `command` in the background with stdout and stderr both written to
/// `log_file`, returning the captured PID immediately.
///
/// The child gets its own process group so terminal signals aimed at the
/// supervisor do not reach it.
pub fn launch(command: &LaunchCommand, log_file: File) -> SupervisorResult<LaunchedProcess> {
    let role = command.role;
    let stderr_file = log_file
        .try_clone()
        .map_err(|e| SupervisorError::spawn_failed(role, format!("Failed to clone log file: {}", e)))?;

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);

    if let Some(ref wd) = command.working_directory {
        cmd.current_dir(wd);
    }

    for (key, value) in &command.environment {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(stderr_file))
        .process_group(0)
        .kill_on_drop(false);

    let child = cmd.spawn().map_err(|e| {
        SupervisorError::spawn_failed(role, format!("{}: {}", command.display(), e))
    })?;

    let pid = child
        .id()
        .ok_or_else(|| SupervisorError::spawn_failed(role, "process exited before its PID was read"))?;

    info!("Launched {} (PID: {}): {}", role, pid, command.display());
    Ok(LaunchedProcess { role, pid, child })
}
