//! Stale occupants of the configured ports are killed before launch.

use e2e_tests::assertions::*;
use e2e_tests::{get_testexe_path, pid_alive, wait_until, Installation};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

#[test]
fn test_bring_up_reclaims_occupied_ports() {
    let install = Installation::new("port-reclamation");

    let spawn_idle = |port: u16| {
        Command::new(get_testexe_path())
            .args(["idle", "--port", &port.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn idle testexe")
    };
    let mut backend_squatter = spawn_idle(install.backend_port);
    let mut frontend_squatter = spawn_idle(install.frontend_range.1);

    // Both squatters must be listening before bring-up scans
    let listening = |port: u16| std::net::TcpStream::connect(("127.0.0.1", port)).is_ok();
    assert!(wait_until(Duration::from_secs(5), || listening(install.backend_port)));
    assert!(wait_until(Duration::from_secs(5), || listening(install.frontend_range.1)));

    let result = (|| {
        let output = install.run(&["bring-up"]);
        assert_ctl_succeeded(&output)?;

        for squatter in [&mut backend_squatter, &mut frontend_squatter] {
            let pid = squatter.id();
            match squatter.wait_timeout(Duration::from_secs(5)) {
                Ok(Some(status)) if !status.success() => {}
                other => return Err(format!("Squatter {} was not killed: {:?}", pid, other)),
            }
        }

        let state = assert_state_file_written(&install)?;
        if !pid_alive(state.backend_pid) {
            return Err("Backend did not survive reclamation".to_string());
        }
        Ok::<(), String>(())
    })();

    backend_squatter.kill().ok();
    frontend_squatter.kill().ok();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}
