//! RustAx Server - annotated endpoints over HTTP.
//!
//! Hosts the demo endpoints (`/greetings`, `/echo`, `/health`) below a
//! configurable API root, dispatching every request through the RustAx
//! negotiation pipeline.
//!
//! # Usage
//!
//! ```text
//! RUSTAX_LISTEN=127.0.0.1:8080 RUSTAX_BASE_PATH=/api rustax-server
//! curl -H 'Accept: application/json' http://127.0.0.1:8080/api/greetings/ada
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUSTAX_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `RUSTAX_BASE_PATH` | `/` | API root all endpoints live under |
//! | `RUSTAX_MAX_BODY_BYTES` | `2097152` | Largest accepted request body |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUSTAX_LOG_FORMAT` | `text` | `text` or `json` log lines |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod endpoints;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use rustax_core::RustAxConfig;
use rustax_http::{RustAxHttpConfig, RustAxHttpService};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported by the health endpoint.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Build the log filter. `RUST_LOG` directives win over `LOG_LEVEL`.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter> {
    match rust_log {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid RUST_LOG directives: {directives}")),
        None => EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}")),
    }
}

/// Install the global subscriber, as text or JSON lines.
fn init_tracing(config: &RustAxConfig) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), &config.log_level)?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

/// Build the [`RustAxHttpConfig`] from the application [`RustAxConfig`].
fn build_http_config(config: &RustAxConfig) -> RustAxHttpConfig {
    RustAxHttpConfig {
        max_body_bytes: config.max_body_bytes,
    }
}

/// Path of the health endpoint below the API root.
fn health_path(base_path: &str) -> String {
    format!("{}/health", base_path.trim_end_matches('/'))
}

/// Resolves on Ctrl-C, or on SIGTERM where there is one.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c"),
        () = terminate => info!("received SIGTERM"),
    }
}

/// Accept connections until `shutdown` resolves, then drain the open ones.
async fn serve<S>(listener: TcpListener, service: RustAxHttpService, shutdown: S) -> Result<()>
where
    S: Future<Output = ()>,
{
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());
    let mut accepted: u64 = 0;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        // Usually EMFILE. Retry once some connections have closed.
                        warn!(error = %e, "accept failed, backing off");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                accepted += 1;

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());
                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        debug!(%peer_addr, error = %e, "connection closed with error");
                    }
                });
            }

            () = &mut shutdown => break,
        }
    }

    info!(accepted, "stopped accepting, draining open connections");
    graceful.shutdown().await;
    info!("drained");
    Ok(())
}

/// Request the health endpoint and require a `200` reporting `running`.
async fn run_health_check(addr: &str, path: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\n\
         Accept: application/json\r\nConnection: close\r\n\r\n"
    );
    writer.write_all(request.as_bytes()).await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RustAxConfig::from_env();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr, &health_path(&config.base_path))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config)?;

    let dispatcher = endpoints::dispatcher(&config.base_path)
        .with_context(|| format!("failed to register endpoints under {}", config.base_path))?;
    let endpoints: Vec<_> = dispatcher.endpoints().base_paths().map(str::to_owned).collect();
    let service = RustAxHttpService::new(Arc::new(dispatcher), build_http_config(&config));

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        base_path = %config.base_path,
        endpoints = ?endpoints,
        version = VERSION,
        "starting RustAx Server",
    );

    serve(listener, service, shutdown_signal()).await
}
