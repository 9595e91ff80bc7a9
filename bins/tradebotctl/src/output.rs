//! Operator-facing output.

use clap::ValueEnum;
use tbs_common::SupervisorError;
use tbs_supervisor::{BringUpReport, StatusReport, Supervisor, TearDownReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_bring_up(report: &BringUpReport) {
    println!("Trading bot is running");
    print_row("Backend", &format!("{} (PID {})", report.backend_url, report.backend.pid));
    print_row("Frontend", &format!("{} (PID {})", report.frontend_url, report.frontend.pid));
    if !report.frontend_ready {
        println!("  Frontend readiness was not confirmed; the URL assumes the default port.");
    }
    print_row("Backend log", &report.backend.log_path.display().to_string());
    print_row("Frontend log", &report.frontend.log_path.display().to_string());
}

/// Captured output of the role a fatal error is attributed to.
pub fn print_log_tail(err: &SupervisorError, supervisor: &Supervisor) {
    let tail = err.log_tail();
    if tail.is_empty() {
        return;
    }

    if let Some(role) = err.role() {
        eprintln!(
            "\nLast {} lines of {}:",
            tail.len(),
            supervisor.role_log(role).path().display()
        );
    }
    for line in tail {
        eprintln!("  {}", line);
    }
}

pub fn print_tear_down(report: &TearDownReport) {
    println!("Tear-down ({} mode)", report.mode.as_str());
    for stop in &report.stops {
        let who = match stop.pid {
            Some(pid) => format!("{} (PID {})", stop.role, pid),
            None => stop.role.to_string(),
        };
        print_row(&who, stop.outcome.describe());
    }
    if report.state_file_removed {
        println!("  State file removed");
    }
}

pub fn print_status(report: &StatusReport, format: OutputFormat) {
    if format == OutputFormat::Json {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: failed to serialize status: {}", e),
        }
        return;
    }

    println!(
        "State file: {} ({})",
        report.state_file.display(),
        if report.state_file_present { "present" } else { "absent" }
    );
    for role in &report.roles {
        let process = match role.pid {
            Some(pid) if role.alive => format!("PID {} running", pid),
            Some(pid) => format!("PID {} not running", pid),
            None => "no recorded PID".to_string(),
        };
        print_row(role.role.as_str(), &format!("{} [ports {}]", process, role.ports));

        for listener in &role.listeners {
            let owner = listener
                .pid
                .map(|pid| format!("PID {}", pid))
                .unwrap_or_else(|| "unknown owner".to_string());
            println!("    port {} held by {}", listener.port, owner);
        }
    }
}

fn print_row(label: &str, value: &str) {
    println!("  {:<22} {}", format!("{}:", label), value);
}
