//! Rustack Browse - a web file browser for S3-compatible object storage.
//!
//! Serves a bucket list, a directory-style view of each bucket, and object
//! downloads. Listings are cached per bucket and prefix; `?refresh=true`
//! bypasses the cache for one page.
//!
//! # Usage
//!
//! ```text
//! AWS_ENDPOINT=localhost:4566 BROWSE_CACHE_DURATION=15m rustack-browse
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BROWSE_LISTEN` | `0.0.0.0:1323` | Bind address |
//! | `BROWSE_SITE_NAME` | `rustack-browse` | Title shown on every page |
//! | `BROWSE_CACHE_DURATION` | `60m` | Listing cache time-to-live |
//! | `BROWSE_SWEEP_INTERVAL` | `60s` | Minimum gap between cache sweeps |
//! | `AWS_REGION` | *(SDK chain, then `us-east-1`)* | Storage region |
//! | `AWS_PROFILE` | *(unset)* | Shared-config profile |
//! | `AWS_ENDPOINT` | *(unset)* | Endpoint override, path-style addressing |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for JSON log lines |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod s3;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rustack_browse_core::{BrowseConfig, BrowseService};
use rustack_browse_http::service::{BrowseHttpConfig, BrowseHttpService};

use crate::s3::AwsS3Gateway;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: BrowseHttpService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Bind the listening socket for `listen`.
async fn bind_listener(listen: &str) -> Result<TcpListener> {
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid bind address: {listen}"))?;

    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))
}

/// Probe the health endpoint of a running server.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /_health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if is_healthy_response(&response) {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

fn is_healthy_response(response: &str) -> bool {
    response.starts_with("HTTP/1.1 200") && response.contains("\"status\":\"running\"")
}

/// The address a local health probe should connect to.
fn probe_address(listen: &str) -> String {
    listen.replace("0.0.0.0", "127.0.0.1")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = BrowseConfig::from_env();
        let healthy = run_health_check(&probe_address(&config.listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let (config, rejected) = BrowseConfig::parse_env();

    init_tracing(&config.log_level, config.log_json)?;
    for setting in &rejected {
        setting.log();
    }

    info!(
        listen = %config.listen,
        site_name = %config.site_name,
        cache_duration = ?config.cache_duration,
        sweep_interval = ?config.sweep_interval,
        aws_region = ?config.aws_region,
        aws_profile = ?config.aws_profile,
        aws_endpoint = ?config.endpoint_url(),
        version = VERSION,
        "starting Rustack Browse",
    );

    let gateway = AwsS3Gateway::from_config(&config).await;
    let service = BrowseService::from_config(Arc::new(gateway), &config);
    let http_service = BrowseHttpService::new(Arc::new(service), BrowseHttpConfig::from(&config));

    let listener = bind_listener(&config.listen).await?;
    let addr = listener
        .local_addr()
        .context("failed to read bound address")?;

    info!(%addr, "listening for connections");

    serve(listener, http_service).await
}
