// E2E Test Framework for the trading bot supervisor

pub mod assertions;
pub mod installation;

pub use installation::{CtlOutput, Installation};

use std::env;
use std::net::TcpListener;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn target_dir() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current exe path")
        .parent()
        .expect("Failed to get parent dir")
        .to_path_buf();

    // If we're in deps/, go up one level
    if path.ends_with("deps") {
        path.pop();
    }
    path
}

fn binary_path(name: &str) -> PathBuf {
    let mut path = target_dir();

    #[cfg(windows)]
    path.push(format!("{}.exe", name));

    #[cfg(not(windows))]
    path.push(name);

    if !path.exists() {
        panic!(
            "{} binary not found at: {} (build the workspace first)",
            name,
            path.display()
        );
    }

    path
}

/// Get the path to the tradebotctl binary
pub fn get_tradebotctl_path() -> PathBuf {
    binary_path("tradebotctl")
}

/// Get the path to the TESTEXE (testexe) binary
pub fn get_testexe_path() -> PathBuf {
    binary_path("testexe")
}

/// Create a fresh test directory under target/tmp
pub fn create_test_dir(test_name: &str) -> PathBuf {
    // target/<profile>/ -> target/tmp
    let temp_dir = target_dir()
        .parent()
        .expect("Failed to get target dir")
        .join("tmp")
        .join(format!("e2e-test-{}", test_name));

    if temp_dir.exists() {
        std::fs::remove_dir_all(&temp_dir).ok();
    }
    std::fs::create_dir_all(&temp_dir).expect("Failed to create test directory");
    temp_dir
}

/// Clean up test directory
pub fn cleanup_test_dir(dir: &PathBuf) {
    if dir.exists() {
        std::fs::remove_dir_all(dir).ok();
    }
}

/// A port nobody is listening on right now.
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .expect("Failed to allocate a port")
        .port()
}

/// `len` consecutive free ports.
pub fn free_port_range(len: u16) -> (u16, u16) {
    for _ in 0..50 {
        let start = free_port();
        let Some(end) = start.checked_add(len - 1) else {
            continue;
        };
        let held: Vec<TcpListener> = (start..=end)
            .filter_map(|port| TcpListener::bind(("127.0.0.1", port)).ok())
            .collect();
        if held.len() == len as usize {
            return (start, end);
        }
    }
    panic!("Could not find {} consecutive free ports", len);
}

/// Liveness as the supervisor sees it: zombies count as gone. A failed
/// check counts as alive so "gone" assertions never pass by accident.
pub fn pid_alive(pid: u32) -> bool {
    tbs_process::process_exists(pid).unwrap_or(true)
}

/// Poll `condition` every 50ms until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_pid_alive_treats_zombie_as_gone() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        assert!(pid_alive(pid));

        // Killed but not yet reaped
        child.kill().unwrap();
        assert!(wait_until(Duration::from_secs(5), || !pid_alive(pid)));
        child.wait().unwrap();
    }

    #[test]
    fn test_pid_alive_rejects_out_of_range_pid() {
        assert!(!pid_alive(u32::MAX));
    }
}
