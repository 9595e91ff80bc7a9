//! Per-role log files.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tbs_common::{Role, SupervisorError, SupervisorResult};
use tracing::debug;

/// The captured output file of one role: `<log_dir>/<role>.log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleLog {
    role: Role,
    path: PathBuf,
}

impl RoleLog {
    pub fn new(log_dir: impl AsRef<Path>, role: Role) -> Self {
        Self {
            role,
            path: log_dir.as_ref().join(format!("{}.log", role.as_str())),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log file (and its directory), truncating any previous run.
    ///
    /// The returned handle is meant to become the child's stdout.
    pub fn create_truncated(&self) -> SupervisorResult<File> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SupervisorError::spawn_failed(
                    self.role,
                    format!("Failed to create log directory {}: {}", parent.display(), e),
                )
            })?;
        }

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                SupervisorError::spawn_failed(
                    self.role,
                    format!("Failed to open log file {}: {}", self.path.display(), e),
                )
            })
    }

    /// All lines captured so far. A missing file reads as empty.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_lines(&self) -> SupervisorResult<Vec<String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Last `n` lines, for failure reports. Never fails: an unreadable log
    /// yields an empty tail.
    pub fn tail(&self, n: usize) -> Vec<String> {
        match self.read_lines() {
            Ok(mut lines) => {
                let skip = lines.len().saturating_sub(n);
                lines.drain(..skip);
                lines
            }
            Err(e) => {
                debug!("Could not read {} log {}: {}", self.role, self.path.display(), e);
                Vec::new()
            }
        }
    }
}
