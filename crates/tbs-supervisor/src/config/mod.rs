//! Supervisor configuration.
//!
//! Every field has a default matching the reference installation
//! (`python3 src/backend/api.py` on 5001, `npm run dev` on 5173-5179), so an
//! empty file, or no file at all, is a valid configuration.
//!
//! All waits are expressed in *time units*. `supervisor.time_unit` is one
//! second in production; tests shrink it to milliseconds without touching
//! the individual budgets.

pub mod validation;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tbs_common::{PortRange, Role};
use tbs_monitoring::WaitBudget;
use tbs_process::LaunchCommand;

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorConfig {
    #[serde(default)]
    pub supervisor: SupervisorOptions,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Graceful window for processes found by port scan rather than from the
    /// state file.
    #[serde(default = "default_discovery_graceful_wait_units")]
    pub discovery_graceful_wait_units: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorOptions {
    /// PID state file, relative to the installation root.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Directory holding `backend.log` and `frontend.log`.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Lines of captured output shown on a fatal failure.
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,

    #[serde(default = "default_time_unit", with = "duration_serde")]
    pub time_unit: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_backend_command")]
    pub command: String,
    #[serde(default = "default_backend_args")]
    pub args: Vec<String>,
    #[serde(default = "default_backend_working_directory")]
    pub working_directory: String,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    #[serde(default = "default_backend_port")]
    pub port: u16,
    /// Path probed during bring-up.
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Path appended to the reported access URL.
    #[serde(default = "default_url_path")]
    pub url_path: String,
    #[serde(default = "default_backend_launch_delay_units")]
    pub launch_delay_units: u32,
    #[serde(default)]
    pub health_check: HealthCheckConfig,
    #[serde(default = "default_graceful_wait_units")]
    pub graceful_wait_units: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheckConfig {
    #[serde(default = "default_health_attempts")]
    pub attempts: u32,
    #[serde(default = "default_health_interval_units")]
    pub interval_units: u32,
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrontendConfig {
    #[serde(default = "default_frontend_command")]
    pub command: String,
    #[serde(default = "default_frontend_args")]
    pub args: Vec<String>,
    #[serde(default = "default_frontend_working_directory")]
    pub working_directory: String,
    #[serde(default)]
    pub environment: HashMap<String, String>,
    /// Candidate ports; the dev server takes the first free one.
    #[serde(default = "default_frontend_port_range")]
    pub port_range: PortRange,
    #[serde(default = "default_ready_marker")]
    pub ready_marker: String,
    #[serde(default = "default_local_marker")]
    pub local_marker: String,
    #[serde(default = "default_frontend_launch_delay_units")]
    pub launch_delay_units: u32,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default = "default_graceful_wait_units")]
    pub graceful_wait_units: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadinessConfig {
    #[serde(default = "default_readiness_attempts")]
    pub attempts: u32,
    #[serde(default = "default_readiness_interval_units")]
    pub interval_units: u32,
}

impl SupervisorConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping.
        let config: SupervisorConfig = if content.trim().is_empty() {
            SupervisorConfig::default()
        } else {
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// `units` time units as a duration.
    pub fn units(&self, units: u32) -> Duration {
        self.supervisor.time_unit * units
    }

    pub fn launch_delay(&self, role: Role) -> Duration {
        match role {
            Role::Backend => self.units(self.backend.launch_delay_units),
            Role::Frontend => self.units(self.frontend.launch_delay_units),
        }
    }

    /// Graceful window for a process read from the state file.
    pub fn graceful_wait(&self, role: Role) -> Duration {
        match role {
            Role::Backend => self.units(self.backend.graceful_wait_units),
            Role::Frontend => self.units(self.frontend.graceful_wait_units),
        }
    }

    pub fn discovery_graceful_wait(&self) -> Duration {
        self.units(self.discovery_graceful_wait_units)
    }

    /// Backend health polling. Exhausting it aborts bring-up.
    pub fn health_budget(&self) -> WaitBudget {
        WaitBudget::fatal(
            self.backend.health_check.attempts,
            self.units(self.backend.health_check.interval_units),
        )
    }

    /// Frontend readiness polling. Exhausting it only warns.
    pub fn readiness_budget(&self) -> WaitBudget {
        WaitBudget::soft(
            self.frontend.readiness.attempts,
            self.units(self.frontend.readiness.interval_units),
        )
    }

    /// Ports a role may occupy.
    pub fn port_range(&self, role: Role) -> PortRange {
        match role {
            Role::Backend => PortRange::single(self.backend.port),
            Role::Frontend => self.frontend.port_range,
        }
    }

    /// The port a role is assumed to use when nothing better is known.
    pub fn default_port(&self, role: Role) -> u16 {
        self.port_range(role).first()
    }

    /// Resolve every path against the installation root.
    pub fn resolve(&self, root: impl AsRef<Path>) -> ResolvedPaths {
        let root = root.as_ref();
        ResolvedPaths {
            root: root.to_path_buf(),
            state_file: root.join(&self.supervisor.state_file),
            log_dir: root.join(&self.supervisor.log_dir),
            backend_dir: root.join(&self.backend.working_directory),
            frontend_dir: root.join(&self.frontend.working_directory),
        }
    }

    /// The launch command for a role, with its working directory resolved.
    pub fn launch_command(&self, role: Role, paths: &ResolvedPaths) -> LaunchCommand {
        let (command, args, env) = match role {
            Role::Backend => (&self.backend.command, &self.backend.args, &self.backend.environment),
            Role::Frontend => (&self.frontend.command, &self.frontend.args, &self.frontend.environment),
        };

        let mut launch = LaunchCommand::new(role, command.as_str())
            .with_args(args.iter().cloned())
            .with_working_directory(paths.working_directory(role));
        for (key, value) in env {
            launch = launch.with_env(key.as_str(), value.as_str());
        }
        launch
    }
}

/// Installation-root-relative paths made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub state_file: PathBuf,
    pub log_dir: PathBuf,
    pub backend_dir: PathBuf,
    pub frontend_dir: PathBuf,
}

impl ResolvedPaths {
    pub fn working_directory(&self, role: Role) -> &Path {
        match role {
            Role::Backend => &self.backend_dir,
            Role::Frontend => &self.frontend_dir,
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            supervisor: SupervisorOptions::default(),
            backend: BackendConfig::default(),
            frontend: FrontendConfig::default(),
            discovery_graceful_wait_units: default_discovery_graceful_wait_units(),
        }
    }
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_dir: default_log_dir(),
            log_tail_lines: default_log_tail_lines(),
            time_unit: default_time_unit(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: default_backend_command(),
            args: default_backend_args(),
            working_directory: default_backend_working_directory(),
            environment: HashMap::new(),
            port: default_backend_port(),
            health_path: default_health_path(),
            url_path: default_url_path(),
            launch_delay_units: default_backend_launch_delay_units(),
            health_check: HealthCheckConfig::default(),
            graceful_wait_units: default_graceful_wait_units(),
        }
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            attempts: default_health_attempts(),
            interval_units: default_health_interval_units(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            command: default_frontend_command(),
            args: default_frontend_args(),
            working_directory: default_frontend_working_directory(),
            environment: HashMap::new(),
            port_range: default_frontend_port_range(),
            ready_marker: default_ready_marker(),
            local_marker: default_local_marker(),
            launch_delay_units: default_frontend_launch_delay_units(),
            readiness: ReadinessConfig::default(),
            graceful_wait_units: default_graceful_wait_units(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: default_readiness_attempts(),
            interval_units: default_readiness_interval_units(),
        }
    }
}

// Default value functions
fn default_state_file() -> String {
    tbs_process_file::DEFAULT_STATE_FILE.to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_log_tail_lines() -> usize {
    20
}

fn default_time_unit() -> Duration {
    Duration::from_secs(1)
}

fn default_backend_command() -> String {
    "python3".to_string()
}

fn default_backend_args() -> Vec<String> {
    vec!["src/backend/api.py".to_string()]
}

fn default_backend_working_directory() -> String {
    ".".to_string()
}

fn default_backend_port() -> u16 {
    5001
}

fn default_health_path() -> String {
    "/trading/status".to_string()
}

fn default_url_path() -> String {
    "/trading".to_string()
}

fn default_backend_launch_delay_units() -> u32 {
    3
}

fn default_health_attempts() -> u32 {
    10
}

fn default_health_interval_units() -> u32 {
    2
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_graceful_wait_units() -> u32 {
    2
}

fn default_discovery_graceful_wait_units() -> u32 {
    1
}

fn default_frontend_command() -> String {
    "npm".to_string()
}

fn default_frontend_args() -> Vec<String> {
    vec!["run".to_string(), "dev".to_string()]
}

fn default_frontend_working_directory() -> String {
    "src/frontend".to_string()
}

fn default_frontend_port_range() -> PortRange {
    PortRange::new(5173, 5179)
}

fn default_ready_marker() -> String {
    "ready in".to_string()
}

fn default_local_marker() -> String {
    "Local:".to_string()
}

fn default_frontend_launch_delay_units() -> u32 {
    5
}

fn default_readiness_attempts() -> u32 {
    30
}

fn default_readiness_interval_units() -> u32 {
    1
}

// Durations are written as "<n>ms", "<n>s" or "<n>m".
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let invalid = || format!("Invalid duration: {}", s);

        // "ms" before "s", since "ms" ends with 's'
        if let Some(num) = s.strip_suffix("ms") {
            num.trim().parse().map(Duration::from_millis).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('s') {
            num.trim().parse().map(Duration::from_secs).map_err(|_| invalid())
        } else if let Some(num) = s.strip_suffix('m') {
            num.trim()
                .parse::<u64>()
                .map(|mins| Duration::from_secs(mins * 60))
                .map_err(|_| invalid())
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}
