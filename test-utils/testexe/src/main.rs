use clap::{Parser, Subcommand};
use std::io::Write;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Stand-in services for trading bot supervisor E2E testing
#[derive(Parser, Debug)]
#[command(name = "testexe")]
#[command(about = "Fake backend/frontend services for supervisor testing", long_about = None)]
struct Args {
    /// Exit on its own this many milliseconds after startup
    #[arg(long, global = true)]
    exit_after_ms: Option<u64>,

    /// Exit code used when exiting on its own
    #[arg(long, global = true, default_value = "1")]
    exit_code: i32,

    /// Keep running after SIGTERM (only SIGKILL stops it)
    #[arg(long, global = true)]
    ignore_sigterm: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// HTTP API answering every request with 200
    Backend {
        #[arg(long)]
        port: u16,

        /// Milliseconds before the port starts accepting requests
        #[arg(long, default_value = "0")]
        health_delay_ms: u64,

        /// Never open the port
        #[arg(long)]
        no_http: bool,
    },
    /// Dev server that binds a port and prints a readiness banner
    Frontend {
        #[arg(long)]
        port: u16,

        /// Bind without printing the banner
        #[arg(long)]
        silent: bool,
    },
    /// Holds a port and does nothing else
    Idle {
        #[arg(long)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    info!("Starting testexe with args: {:?}", args);

    let server = match args.mode {
        Mode::Backend {
            port,
            health_delay_ms,
            no_http,
        } => {
            if no_http {
                info!("Backend running without HTTP");
                None
            } else {
                Some(tokio::spawn(run_backend(port, health_delay_ms)))
            }
        }
        Mode::Frontend { port, silent } => {
            let listener = bind_or_exit(port).await;
            if !silent {
                print_vite_banner(port);
            }
            Some(tokio::spawn(hold(listener)))
        }
        Mode::Idle { port } => {
            let listener = bind_or_exit(port).await;
            info!("Idle on port {}", port);
            Some(tokio::spawn(hold(listener)))
        }
    };

    let exit_code = tokio::select! {
        _ = wait_for_exit_timer(args.exit_after_ms) => {
            error!("Simulated failure: exiting with code {}", args.exit_code);
            args.exit_code
        }
        _ = wait_for_shutdown(args.ignore_sigterm) => {
            info!("Testexe received signal");
            0
        }
    };

    if let Some(task) = server {
        task.abort();
    }

    info!("Testexe stopped");
    std::process::exit(exit_code);
}

fn print_vite_banner(port: u16) {
    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout);
    let _ = writeln!(stdout, "  VITE v5.0.0  ready in 312 ms");
    let _ = writeln!(stdout);
    let _ = writeln!(stdout, "  \u{1b}[32m➜\u{1b}[39m  \u{1b}[1mLocal\u{1b}[22m:   \u{1b}[36mhttp://localhost:{}/\u{1b}[39m", port);
    let _ = writeln!(stdout, "  ➜  Network: use --host to expose");
    let _ = stdout.flush();
}

async fn bind_or_exit(port: u16) -> TcpListener {
    let addr = format!("127.0.0.1:{}", port);
    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            info!("Listening on {}", addr);
            listener
        }
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(2);
        }
    }
}

/// Accept and drop connections so the socket stays in LISTEN.
async fn hold(listener: TcpListener) {
    loop {
        if let Err(e) = listener.accept().await {
            warn!("Failed to accept connection: {}", e);
        }
    }
}

async fn wait_for_exit_timer(exit_after_ms: Option<u64>) {
    match exit_after_ms {
        Some(ms) => sleep(Duration::from_millis(ms)).await,
        None => std::future::pending().await,
    }
}

#[cfg(unix)]
async fn wait_for_shutdown(ignore_sigterm: bool) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        _ => {
            error!("Failed to setup signal handlers");
            std::process::exit(1);
        }
    };

    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
                if ignore_sigterm {
                    warn!("Ignoring SIGTERM as requested");
                    continue;
                }
                return;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
                return;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_ignore_sigterm: bool) {
    let _ = tokio::signal::ctrl_c().await;
}

async fn run_backend(port: u16, health_delay_ms: u64) {
    use http_body_util::Full;
    use hyper::body::Bytes;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;

    if health_delay_ms > 0 {
        info!("Startup delay: waiting {}ms before serving", health_delay_ms);
        sleep(Duration::from_millis(health_delay_ms)).await;
    }

    let listener = bind_or_exit(port).await;
    println!("INFO:     Uvicorn running on http://127.0.0.1:{} (Press CTRL+C to quit)", port);
    let start_time = Instant::now();

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let io = TokioIo::new(stream);
        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                debug!(
                    "{} {} after {}ms",
                    req.method(),
                    req.uri().path(),
                    start_time.elapsed().as_millis()
                );
                async move {
                    Ok::<_, hyper::Error>(Response::new(Full::new(Bytes::from(
                        "{\"status\":\"ok\"}\n",
                    ))))
                }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {}", e);
            }
        });
    }
}
