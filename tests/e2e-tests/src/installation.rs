//! A throwaway installation root driven through tradebotctl.

use crate::{cleanup_test_dir, create_test_dir, free_port, free_port_range, get_testexe_path, get_tradebotctl_path};
use std::cell::Cell;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tbs_process_file::{PersistedState, DEFAULT_STATE_FILE};
use wait_timeout::ChildExt;

/// Time unit written into every test configuration.
pub const TIME_UNIT_MS: u64 = 50;

const CTL_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of one tradebotctl invocation.
#[derive(Debug)]
pub struct CtlOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CtlOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Installation root with its own ports, config and state file.
///
/// The frontend is told to bind the second port of its range, so a
/// passing test proves the port was read from the readiness banner.
pub struct Installation {
    pub dir: PathBuf,
    pub backend_port: u16,
    pub frontend_range: (u16, u16),
    pub backend_args: Vec<String>,
    pub frontend_args: Vec<String>,
    pub health_attempts: u32,
    pub readiness_attempts: u32,
    runs: Cell<u32>,
}

impl Installation {
    pub fn new(test_name: &str) -> Self {
        let backend_port = free_port();
        let frontend_range = free_port_range(3);
        let frontend_port = frontend_range.0 + 1;

        Self {
            dir: create_test_dir(test_name),
            backend_port,
            frontend_range,
            backend_args: args(&["backend", "--port", &backend_port.to_string()]),
            frontend_args: args(&["frontend", "--port", &frontend_port.to_string()]),
            health_attempts: 20,
            readiness_attempts: 40,
            runs: Cell::new(0),
        }
    }

    /// Port the frontend binds with the default arguments.
    pub fn frontend_port(&self) -> u16 {
        self.frontend_range.0 + 1
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join("tradebot.yaml")
    }

    pub fn state_file(&self) -> PathBuf {
        self.dir.join(DEFAULT_STATE_FILE)
    }

    pub fn log_path(&self, role: &str) -> PathBuf {
        self.dir.join("logs").join(format!("{}.log", role))
    }

    pub fn read_log(&self, role: &str) -> String {
        fs::read_to_string(self.log_path(role)).unwrap_or_default()
    }

    /// Parsed state file, if one exists.
    pub fn state(&self) -> Option<PersistedState> {
        let path = self.state_file();
        let contents = fs::read_to_string(&path).ok()?;
        Some(PersistedState::parse(&path, &contents).expect("State file should parse"))
    }

    pub fn write_config(&self) -> std::io::Result<()> {
        let testexe = get_testexe_path();
        let yaml = format!(
            r#"supervisor:
  time_unit: {unit}ms
  log_tail_lines: 10

discovery_graceful_wait_units: 20

backend:
  command: '{testexe}'
  args: {backend_args}
  working_directory: '.'
  port: {backend_port}
  launch_delay_units: 2
  health_check:
    attempts: {health_attempts}
    interval_units: 2
    request_timeout: 500ms
  graceful_wait_units: 20

frontend:
  command: '{testexe}'
  args: {frontend_args}
  working_directory: '.'
  port_range:
    start: {range_start}
    end: {range_end}
  launch_delay_units: 2
  readiness:
    attempts: {readiness_attempts}
    interval_units: 1
  graceful_wait_units: 20
"#,
            unit = TIME_UNIT_MS,
            testexe = testexe.display(),
            backend_args = yaml_list(&self.backend_args),
            backend_port = self.backend_port,
            health_attempts = self.health_attempts,
            frontend_args = yaml_list(&self.frontend_args),
            range_start = self.frontend_range.0,
            range_end = self.frontend_range.1,
            readiness_attempts = self.readiness_attempts,
        );
        fs::write(self.config_path(), yaml)
    }

    /// Run one tradebotctl subcommand against this installation.
    pub fn run(&self, subcommand: &[&str]) -> CtlOutput {
        println!("Running tradebotctl {}", subcommand.join(" "));
        let output = self.invoke(subcommand).unwrap_or_else(|e| panic!("{}", e));

        for line in output.stdout.lines() {
            println!("[tradebotctl] {}", line);
        }
        for line in output.stderr.lines() {
            println!("[tradebotctl:err] {}", line);
        }
        println!("tradebotctl exited with status: {}", output.status);
        output
    }

    fn invoke(&self, subcommand: &[&str]) -> Result<CtlOutput, String> {
        self.write_config()
            .map_err(|e| format!("Failed to write config: {}", e))?;

        let run = self.runs.get() + 1;
        self.runs.set(run);
        let stdout_path = self.dir.join(format!("ctl-{}.out", run));
        let stderr_path = self.dir.join(format!("ctl-{}.err", run));
        let stdout = File::create(&stdout_path).map_err(|e| format!("Failed to create output file: {}", e))?;
        let stderr = File::create(&stderr_path).map_err(|e| format!("Failed to create output file: {}", e))?;

        let mut child = Command::new(get_tradebotctl_path())
            .arg("--config")
            .arg(self.config_path())
            .arg("--root")
            .arg(&self.dir)
            .args(subcommand)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| format!("Failed to spawn tradebotctl: {}", e))?;

        let status = match child.wait_timeout(CTL_TIMEOUT) {
            Ok(Some(status)) => status,
            Ok(None) => {
                child.kill().ok();
                child.wait().ok();
                return Err(format!(
                    "tradebotctl {} did not finish within {:?}",
                    subcommand.join(" "),
                    CTL_TIMEOUT
                ));
            }
            Err(e) => return Err(format!("Error waiting for tradebotctl: {}", e)),
        };

        Ok(CtlOutput {
            status,
            stdout: fs::read_to_string(&stdout_path).unwrap_or_default(),
            stderr: fs::read_to_string(&stderr_path).unwrap_or_default(),
        })
    }
}

impl Drop for Installation {
    fn drop(&mut self) {
        // Best-effort; the test outcome is already decided.
        if self.config_path().exists() {
            if let Err(e) = self.invoke(&["tear-down"]) {
                println!("Cleanup tear-down failed: {}", e);
            }
        }
        cleanup_test_dir(&self.dir);
    }
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn yaml_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| format!("'{}'", s)).collect();
    format!("[{}]", quoted.join(", "))
}
