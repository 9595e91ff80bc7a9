//! Listening port ownership.
//!
//! Answers "who is listening on these ports?" so bring-up can reclaim ports
//! left behind by a crashed run and tear-down can rediscover processes when
//! no state file exists.

use tbs_common::{PortRange, SupervisorResult};

/// A port in the queried range that has a listening TCP socket.
///
/// `pid` is `None` when the socket's owner cannot be resolved, which
/// happens for processes of other users whose `/proc/<pid>/fd` is unreadable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PortOccupant {
    pub port: u16,
    pub pid: Option<u32>,
}

/// Find every listening occupant of `range`, sorted by port.
///
/// An empty result means every port in the range is free.
pub fn find_listeners(range: PortRange) -> SupervisorResult<Vec<PortOccupant>> {
    let mut occupants = platform::scan(range)?;
    occupants.sort();
    occupants.dedup();
    Ok(occupants)
}

/// PIDs of the processes listening anywhere in `range`, without duplicates.
pub fn listener_pids(range: PortRange) -> SupervisorResult<Vec<u32>> {
    let mut pids: Vec<u32> = find_listeners(range)?
        .into_iter()
        .filter_map(|occupant| occupant.pid)
        .collect();
    pids.sort_unstable();
    pids.dedup();
    Ok(pids)
}

#[cfg(target_os = "linux")]
mod platform {
    use super::PortOccupant;
    use procfs::net::{TcpNetEntry, TcpState};
    use std::collections::HashMap;
    use tbs_common::{PortRange, SupervisorError, SupervisorResult};
    use tracing::debug;

    pub(super) fn scan(range: PortRange) -> SupervisorResult<Vec<PortOccupant>> {
        let mut entries = procfs::net::tcp()
            .map_err(|e| SupervisorError::port_scan(format!("reading /proc/net/tcp: {}", e)))?;

        // Kernels without IPv6 have no tcp6 table.
        match procfs::net::tcp6() {
            Ok(v6) => entries.extend(v6),
            Err(e) => debug!("Skipping /proc/net/tcp6: {}", e),
        }

        let listening: Vec<&TcpNetEntry> = entries
            .iter()
            .filter(|e| e.state == TcpState::Listen && range.contains(e.local_address.port()))
            .collect();

        if listening.is_empty() {
            return Ok(Vec::new());
        }

        let inode_map = build_inode_pid_map();
        Ok(listening
            .into_iter()
            .map(|e| PortOccupant {
                port: e.local_address.port(),
                pid: inode_map.get(&e.inode).copied(),
            })
            .collect())
    }

    /// Socket inode to owning PID, built from `/proc/*/fd` links of the form
    /// `socket:[<inode>]`.
    fn build_inode_pid_map() -> HashMap<u64, u32> {
        let mut map = HashMap::new();
        let Ok(dir) = std::fs::read_dir("/proc") else {
            return map;
        };

        for entry in dir.flatten() {
            let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
                continue;
            };
            let Ok(fds) = std::fs::read_dir(entry.path().join("fd")) else {
                continue;
            };
            for fd in fds.flatten() {
                let Ok(target) = std::fs::read_link(fd.path()) else {
                    continue;
                };
                if let Some(inode) = parse_socket_inode(&target.to_string_lossy()) {
                    map.entry(inode).or_insert(pid);
                }
            }
        }
        map
    }

    pub(super) fn parse_socket_inode(link: &str) -> Option<u64> {
        link.strip_prefix("socket:[")?.strip_suffix(']')?.parse().ok()
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::PortOccupant;
    use std::process::Command;
    use tbs_common::{PortRange, SupervisorError, SupervisorResult};

    pub(super) fn scan(range: PortRange) -> SupervisorResult<Vec<PortOccupant>> {
        let mut occupants = Vec::new();
        for port in range.ports() {
            let output = Command::new("lsof")
                .args(["-nP", &format!("-iTCP:{}", port), "-sTCP:LISTEN", "-t"])
                .output()
                .map_err(|e| SupervisorError::port_scan(format!("running lsof: {}", e)))?;

            // lsof exits 1 when nothing matched.
            if !output.status.success() && output.status.code() != Some(1) {
                return Err(SupervisorError::port_scan(format!(
                    "lsof failed for port {}: {}",
                    port,
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }

            for line in String::from_utf8_lossy(&output.stdout).lines() {
                if let Ok(pid) = line.trim().parse::<u32>() {
                    occupants.push(PortOccupant { port, pid: Some(pid) });
                }
            }
        }
        Ok(occupants)
    }
}
