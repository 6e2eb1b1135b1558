//! On-demand image transformation proxy.
//!
//! Given a request path `/<width>/<height>/<action>/<relative_url>`, the
//! proxy joins the relative URL onto the active platform's image CDN,
//! checks the resulting host against the configured allow-list, fetches
//! the source image, applies the requested transform (resize, fit,
//! identify; crop falls through to identify), and serves the result with
//! long-lived cache headers.
//!
//! ```text
//!     Client Request ──▶ http/server ──▶ routing/decoder
//!                            │                │
//!                            │        security/allowlist
//!                            ▼                │
//!                     gateway (fetch ◀────────┘
//!                        + transform)
//!                            │
//!     Client Response ◀─────┘  (Cache-Control: one year)
//!
//!     Cross-cutting: config, observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use imageable_proxy::config::loader::load_config;
use imageable_proxy::config::ProxyConfig;
use imageable_proxy::observability::{logging, metrics};
use imageable_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "imageable-proxy")]
#[command(about = "On-demand image transformation proxy", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        platform = %config.platform,
        image_size_limit = config.imageable.image_size_limit,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
