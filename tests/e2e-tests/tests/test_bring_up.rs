//! Bring-up happy path and soft readiness timeout.

use e2e_tests::assertions::*;
use e2e_tests::Installation;

fn report(name: &str, result: Result<(), String>) {
    match result {
        Ok(()) => {
            println!("\n========================================");
            println!("✓ TEST PASSED: {}", name);
            println!("========================================\n");
        }
        Err(e) => {
            println!("\n========================================");
            println!("✗ TEST FAILED: {}", name);
            println!("Error: {}", e);
            println!("========================================\n");
            panic!("Test failed: {}", e);
        }
    }
}

#[test]
fn test_bring_up_reports_urls_and_records_pids() {
    let install = Installation::new("bring-up");

    let result = (|| {
        // Step 1: bring everything up
        let output = install.run(&["bring-up"]);
        assert_ctl_succeeded(&output)?;
        assert_stdout_contains(&output, &format!("http://localhost:{}/trading", install.backend_port))?;
        // The frontend was told to skip the first port of its range
        assert_stdout_contains(&output, &format!("http://localhost:{}", install.frontend_port()))?;
        println!("✓ bring-up reported both URLs\n");

        // Step 2: state file holds two live PIDs
        let state = assert_state_file_written(&install)?;
        assert_pid_alive(state.backend_pid)?;
        assert_pid_alive(state.frontend_pid)?;
        assert_log_file_contains(&install.log_path("frontend"), "ready in")?;
        println!("✓ state file records running processes\n");

        // Step 3: status agrees
        let output = install.run(&["status", "--format", "json"]);
        assert_ctl_succeeded(&output)?;
        let status: serde_json::Value =
            serde_json::from_str(&output.stdout).map_err(|e| format!("Bad status JSON: {}", e))?;
        if status["state_file_present"] != true
            || status["roles"][0]["alive"] != true
            || status["roles"][1]["alive"] != true
        {
            return Err(format!("Unexpected status: {}", status));
        }
        println!("✓ status reports both services alive\n");

        // Step 4: tear down
        let output = install.run(&["tear-down"]);
        assert_ctl_succeeded(&output)?;
        assert_stdout_contains(&output, "guided")?;
        assert_pid_gone(state.backend_pid)?;
        assert_pid_gone(state.frontend_pid)?;
        assert_no_state_file(&install)?;
        println!("✓ tear-down stopped both services\n");

        Ok::<(), String>(())
    })();

    report("Bring-up", result);
}

#[test]
fn test_silent_frontend_is_not_fatal() {
    let mut install = Installation::new("silent-frontend");
    let port = install.frontend_range.0.to_string();
    install.frontend_args = vec!["frontend".into(), "--port".into(), port, "--silent".into()];
    install.readiness_attempts = 3;

    let result = (|| {
        let output = install.run(&["bring-up"]);
        assert_ctl_succeeded(&output)?;
        // Falls back to the first port of the range
        assert_stdout_contains(&output, &format!("http://localhost:{}", install.frontend_range.0))?;
        assert_stdout_contains(&output, "readiness was not confirmed")?;

        let state = assert_state_file_written(&install)?;
        assert_pid_alive(state.frontend_pid)?;
        Ok::<(), String>(())
    })();

    report("Silent frontend", result);
}
