use super::*;
use anyhow::{anyhow, Result};

/// Validate the complete configuration
pub fn validate_config(config: &SupervisorConfig) -> Result<()> {
    validate_supervisor_options(&config.supervisor)?;
    validate_backend_config(&config.backend)?;
    validate_frontend_config(&config.frontend)?;

    if config.frontend.port_range.contains(config.backend.port) {
        return Err(anyhow!(
            "Backend port {} lies inside the frontend port range {}; reclaiming frontend ports would kill the backend",
            config.backend.port,
            config.frontend.port_range
        ));
    }

    Ok(())
}

fn validate_supervisor_options(options: &SupervisorOptions) -> Result<()> {
    if options.time_unit.is_zero() {
        return Err(anyhow!("Time unit must be greater than 0"));
    }

    if options.log_tail_lines == 0 {
        return Err(anyhow!("log_tail_lines must be greater than 0"));
    }

    if options.state_file.trim().is_empty() {
        return Err(anyhow!("State file path cannot be empty"));
    }

    if options.log_dir.trim().is_empty() {
        return Err(anyhow!("Log directory cannot be empty"));
    }

    Ok(())
}

fn validate_backend_config(backend: &BackendConfig) -> Result<()> {
    validate_command("backend", &backend.command)?;

    if backend.port == 0 {
        return Err(anyhow!("Backend port must be between 1 and 65535, got: 0"));
    }

    if !backend.health_path.starts_with('/') {
        return Err(anyhow!(
            "Backend health_path must start with '/', got: {}",
            backend.health_path
        ));
    }

    if !backend.url_path.is_empty() && !backend.url_path.starts_with('/') {
        return Err(anyhow!(
            "Backend url_path must be empty or start with '/', got: {}",
            backend.url_path
        ));
    }

    if backend.health_check.attempts == 0 {
        return Err(anyhow!("Backend health check attempts must be greater than 0"));
    }

    if backend.health_check.request_timeout.is_zero() {
        return Err(anyhow!("Backend health check request_timeout must be greater than 0"));
    }

    Ok(())
}

fn validate_frontend_config(frontend: &FrontendConfig) -> Result<()> {
    validate_command("frontend", &frontend.command)?;

    let range = frontend.port_range;
    if range.start == 0 {
        return Err(anyhow!("Frontend port range must start at 1 or above, got: {}", range));
    }
    if range.start > range.end {
        return Err(anyhow!(
            "Frontend port range start {} is greater than end {}",
            range.start,
            range.end
        ));
    }

    if frontend.ready_marker.is_empty() {
        return Err(anyhow!("Frontend ready_marker cannot be empty"));
    }

    if frontend.local_marker.is_empty() {
        return Err(anyhow!("Frontend local_marker cannot be empty"));
    }

    if frontend.readiness.attempts == 0 {
        return Err(anyhow!("Frontend readiness attempts must be greater than 0"));
    }

    Ok(())
}

fn validate_command(role: &str, command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(anyhow!("The {} command cannot be empty", role));
    }
    Ok(())
}
