//! Tear-down: idempotence, discovery fallback, forced stop.

use e2e_tests::assertions::*;
use e2e_tests::Installation;

#[test]
fn test_tear_down_twice() {
    let install = Installation::new("tear-down-twice");

    let result = (|| {
        assert_ctl_succeeded(&install.run(&["bring-up"]))?;

        let first = install.run(&["tear-down"]);
        assert_ctl_succeeded(&first)?;
        assert_stdout_contains(&first, "stopped")?;

        // Nothing left: discovery mode, both roles already stopped, exit 0
        let second = install.run(&["tear-down"]);
        assert_ctl_succeeded(&second)?;
        assert_stdout_contains(&second, "discovery")?;
        if second.stdout.matches("already stopped").count() != 2 {
            return Err(format!("Expected two 'already stopped' rows:\n{}", second.stdout));
        }
        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

#[test]
fn test_discovery_without_state_file() {
    let install = Installation::new("discovery");

    let result = (|| {
        assert_ctl_succeeded(&install.run(&["bring-up"]))?;
        let state = assert_state_file_written(&install)?;
        std::fs::remove_file(install.state_file()).map_err(|e| e.to_string())?;

        let output = install.run(&["tear-down"]);
        assert_ctl_succeeded(&output)?;
        assert_stdout_contains(&output, "discovery")?;
        assert_stdout_contains(&output, &format!("(PID {})", state.backend_pid))?;
        assert_stdout_contains(&output, &format!("(PID {})", state.frontend_pid))?;
        assert_pid_gone(state.backend_pid)?;
        assert_pid_gone(state.frontend_pid)?;
        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

#[test]
fn test_sigterm_ignoring_backend_is_force_killed() {
    let mut install = Installation::new("force-kill");
    install.backend_args.push("--ignore-sigterm".into());

    let result = (|| {
        assert_ctl_succeeded(&install.run(&["bring-up"]))?;
        let state = assert_state_file_written(&install)?;

        let output = install.run(&["tear-down"]);
        assert_ctl_succeeded(&output)?;
        assert_stdout_contains(&output, "force killed")?;
        assert_pid_gone(state.backend_pid)?;
        assert_log_file_contains(&install.log_path("backend"), "Ignoring SIGTERM")?;
        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}
