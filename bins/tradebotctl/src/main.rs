use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use tbs_supervisor::{Supervisor, SupervisorConfig};

mod output;

use output::OutputFormat;

/// Trading bot lifecycle supervisor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML). Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Installation root; relative paths in the configuration resolve
    /// against it. Defaults to the current directory.
    #[arg(short, long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the backend, wait for health, start the frontend, record PIDs
    BringUp,
    /// Stop both services (from the state file, or by port scan)
    TearDown,
    /// Show recorded PIDs, liveness and port owners
    Status {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Tear down, then bring up
    Restart,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.debug);

    let config = match args.config {
        Some(ref path) => {
            info!("Config file: {}", path.display());
            SupervisorConfig::load_from_file(path)?
        }
        None => SupervisorConfig::default(),
    };

    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    info!("Installation root: {}", root.display());

    let supervisor = Supervisor::new(config, root);

    match args.command {
        Command::BringUp => bring_up(&supervisor).await,
        Command::TearDown => {
            let report = supervisor.tear_down().await?;
            output::print_tear_down(&report);
            Ok(())
        }
        Command::Status { format } => {
            let report = supervisor.status().await?;
            output::print_status(&report, format);
            Ok(())
        }
        Command::Restart => match supervisor.restart().await {
            Ok((stopped, started)) => {
                output::print_tear_down(&stopped);
                output::print_bring_up(&started);
                Ok(())
            }
            Err(e) => {
                error!("Restart failed: {}", e);
                output::print_log_tail(&e, &supervisor);
                Err(e.into())
            }
        },
    }
}

async fn bring_up(supervisor: &Supervisor) -> Result<()> {
    match supervisor.bring_up().await {
        Ok(report) => {
            output::print_bring_up(&report);
            Ok(())
        }
        Err(e) => {
            error!("Bring-up failed: {}", e);
            output::print_log_tail(&e, supervisor);
            Err(e.into())
        }
    }
}

fn initialize_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
