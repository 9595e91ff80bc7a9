//! Fatal bring-up failures: nothing is recorded and the operator sees why.

use e2e_tests::assertions::*;
use e2e_tests::Installation;

#[test]
fn test_backend_exit_aborts_before_frontend() {
    println!("\n========================================");
    println!("TEST: Backend exits during launch delay");
    println!("========================================\n");

    let mut install = Installation::new("backend-exit");
    install.backend_args = vec![
        "backend".into(),
        "--port".into(),
        install.backend_port.to_string(),
        "--exit-after-ms".into(),
        "20".into(),
    ];

    let result = (|| {
        let output = install.run(&["bring-up"]);
        assert_ctl_failed(&output)?;
        assert_stderr_contains(&output, "backend launch failed")?;
        // Log tail of the dead backend is shown
        assert_stderr_contains(&output, "Simulated failure")?;
        assert_log_file_absent(&install.log_path("frontend"))?;
        assert_no_state_file(&install)?;
        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
    println!("✓ TEST PASSED: Backend exits during launch delay");
}

#[test]
fn test_health_timeout_is_fatal() {
    println!("\n========================================");
    println!("TEST: Backend never becomes healthy");
    println!("========================================\n");

    let mut install = Installation::new("health-timeout");
    // Self-exits later; nothing listens, so tear-down cannot find it
    install.backend_args = vec![
        "backend".into(),
        "--port".into(),
        install.backend_port.to_string(),
        "--no-http".into(),
        "--exit-after-ms".into(),
        "15000".into(),
    ];
    install.health_attempts = 3;

    let result = (|| {
        let output = install.run(&["bring-up"]);
        assert_ctl_failed(&output)?;
        assert_stderr_contains(&output, "health check failed after 3 attempts")?;
        assert_stderr_contains(&output, "Backend running without HTTP")?;
        assert_log_file_absent(&install.log_path("frontend"))?;
        assert_no_state_file(&install)?;
        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
    println!("✓ TEST PASSED: Backend never becomes healthy");
}

#[test]
fn test_frontend_exit_keeps_backend_running() {
    println!("\n========================================");
    println!("TEST: Frontend exits during launch delay");
    println!("========================================\n");

    let mut install = Installation::new("frontend-exit");
    install.frontend_args = vec![
        "frontend".into(),
        "--port".into(),
        install.frontend_port().to_string(),
        "--exit-after-ms".into(),
        "20".into(),
    ];

    let result = (|| {
        let output = install.run(&["bring-up"]);
        assert_ctl_failed(&output)?;
        assert_stderr_contains(&output, "frontend launch failed")?;
        assert_stderr_contains(&output, "Simulated failure")?;
        assert_no_state_file(&install)?;

        // No rollback: the healthy backend still answers
        if std::net::TcpStream::connect(("127.0.0.1", install.backend_port)).is_err() {
            return Err("Backend was stopped after the frontend failed".to_string());
        }
        Ok::<(), String>(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
    println!("✓ TEST PASSED: Frontend exits during launch delay");
}
