//! # TBS Process File
//!
//! Persisted process state for the supervisor.
//!
//! The state file is the only handoff between `bring-up` and `tear-down`.
//! It is plain text, one `KEY=VALUE` pair per line:
//!
//! ```text
//! BACKEND_PID=41235
//! FRONTEND_PID=41290
//! ```
//!
//! Writes go through a temp file and a rename, so a reader never observes a
//! half-written record.

use serde::Serialize;
use std::path::Path;
use tbs_common::{Role, SupervisorError, SupervisorResult};
use tracing::debug;

/// Default file name of the state file, relative to the installation root.
pub const DEFAULT_STATE_FILE: &str = ".trading_bot.pids";

/// Role to PID mapping of a successful bring-up.
///
/// Both PIDs were confirmed launched when the record was written. They may
/// be stale by the time it is read; callers check liveness before signalling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistedState {
    pub backend_pid: u32,
    pub frontend_pid: u32,
}

impl PersistedState {
    pub fn new(backend_pid: u32, frontend_pid: u32) -> Self {
        Self {
            backend_pid,
            frontend_pid,
        }
    }

    pub fn pid(&self, role: Role) -> u32 {
        match role {
            Role::Backend => self.backend_pid,
            Role::Frontend => self.frontend_pid,
        }
    }

    /// `(role, pid)` pairs in bring-up order.
    pub fn entries(&self) -> [(Role, u32); 2] {
        Role::ALL.map(|role| (role, self.pid(role)))
    }

    /// Render as `KEY=VALUE` lines.
    pub fn to_file_contents(&self) -> String {
        self.entries()
            .iter()
            .map(|(role, pid)| format!("{}={}\n", role.state_key(), pid))
            .collect()
    }

    /// Parse `KEY=VALUE` lines.
    ///
    /// Blank lines, `#` comments and unknown keys are ignored. A missing role
    /// key, a non-numeric value or PID 0 is an error.
    pub fn parse(path: &Path, contents: &str) -> SupervisorResult<Self> {
        let mut backend = None;
        let mut frontend = None;

        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                SupervisorError::state_file(path, format!("line {}: expected KEY=VALUE", index + 1))
            })?;

            let Some(role) = Role::from_state_key(key.trim()) else {
                debug!("Ignoring unknown state key '{}'", key.trim());
                continue;
            };

            let pid = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|pid| *pid > 0)
                .ok_or_else(|| {
                    SupervisorError::state_file(
                        path,
                        format!("invalid PID '{}' for {}", value.trim(), role.state_key()),
                    )
                })?;

            match role {
                Role::Backend => backend = Some(pid),
                Role::Frontend => frontend = Some(pid),
            }
        }

        let missing = |role: Role| SupervisorError::state_file(path, format!("missing {}", role.state_key()));
        Ok(Self {
            backend_pid: backend.ok_or_else(|| missing(Role::Backend))?,
            frontend_pid: frontend.ok_or_else(|| missing(Role::Frontend))?,
        })
    }

    /// Save to disk (atomic write).
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> SupervisorResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SupervisorError::state_file(
                    path,
                    format!("Failed to create directory {}: {}", parent.display(), e),
                )
            })?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, self.to_file_contents())
            .await
            .map_err(|e| SupervisorError::state_file(path, format!("Failed to write: {}", e)))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| SupervisorError::state_file(path, format!("Failed to rename: {}", e)))?;

        debug!("Saved process state to {}", path.display());
        Ok(())
    }

    /// Load from disk. `Ok(None)` when the file does not exist.
    pub async fn load<P: AsRef<Path>>(path: P) -> SupervisorResult<Option<Self>> {
        let path = path.as_ref();
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SupervisorError::state_file(path, format!("Failed to read: {}", e)))
            }
        };

        Self::parse(path, &contents).map(Some)
    }

    /// Delete from disk. Deleting a missing file is not an error.
    pub async fn delete<P: AsRef<Path>>(path: P) -> SupervisorResult<()> {
        let path = path.as_ref();
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                debug!("Removed process state file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SupervisorError::state_file(path, format!("Failed to delete: {}", e))),
        }
    }
}
