//! NSE market-data proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──GET /nse/...──▶ http server ──▶ upstream client ──▶ session ──▶ nseindia.com
//!                                 │                 │                │
//!                                 │                 │                └─ cookies from warm-up
//!                                 │                 └─ reset + single retry, normalization
//!                                 └─ timeout, request ID, tracing, CORS, metrics
//! ```
//!
//! Startup order: CLI → config → logging → metrics → session → listener.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use nse_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use nse_proxy::lifecycle::{shutdown_on_signal, Shutdown};
use nse_proxy::observability::{init_logging, metrics};
use nse_proxy::{HttpServer, UpstreamClient};

#[derive(Parser)]
#[command(name = "nse-proxy", version)]
#[command(about = "JSON proxy for NSE India market data", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "nse-proxy starting"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let client = UpstreamClient::connect(&config).await?;
    tracing::info!(warmup_url = %config.upstream.warmup_url, "Upstream session established");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    shutdown_on_signal(shutdown);

    let server = HttpServer::new(config, Arc::new(client));
    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
