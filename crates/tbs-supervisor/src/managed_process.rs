use serde::Serialize;
use std::path::{Path, PathBuf};
use tbs_common::Role;

/// One supervised external process, as known to the supervisor.
///
/// The port starts as the role's default and is updated once the process
/// reports the port it actually bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedProcess {
    pub role: Role,
    pub pid: u32,
    pub port: u16,
    pub log_path: PathBuf,
}

impl ManagedProcess {
    pub fn new(role: Role, pid: u32, port: u16, log_path: impl Into<PathBuf>) -> Self {
        Self {
            role,
            pid,
            port,
            log_path: log_path.into(),
        }
    }

    pub fn record_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// `http://localhost:<port><path>`
    pub fn url(&self, path: &str) -> String {
        format!("http://localhost:{}{}", self.port, path)
    }
}
