//! `rpc-middleware` entry point: serves the calculator application over the
//! configured transport until Ctrl+C.

use std::path::PathBuf;

use clap::Parser;

use rpc_middleware::app;
use rpc_middleware::config::{load_config, validate_config, MiddlewareConfig, TransportKind};
use rpc_middleware::lifecycle::signals;
use rpc_middleware::observability::{logging, metrics};
use rpc_middleware::{MiddlewareServer, Shutdown};

#[derive(Parser)]
#[command(name = "rpc-middleware")]
#[command(about = "Remote-invocation middleware serving the calculator application", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Transport override (tcp or udp)
    #[arg(short, long)]
    transport: Option<TransportKind>,

    /// Port override, keeping the configured host
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MiddlewareConfig::default(),
    };
    if let Some(kind) = cli.transport {
        config.transport.kind = kind;
    }
    if let Some(port) = cli.port {
        config.transport.set_port(port);
    }
    validate_config(&config).map_err(|errors| {
        errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    })?;

    logging::init_logging(&config.observability)?;
    tracing::info!("rpc-middleware v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        transport = %config.transport.kind,
        bind_address = %config.transport.bind_address,
        max_connections = config.transport.max_connections,
        buffer_size = config.datagram.buffer_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = MiddlewareServer::new(config);
    server.register_all(app::operations()?);

    let bound = server.bind().await?;
    let shutdown = Shutdown::new();
    signals::trigger_on_ctrl_c(shutdown.clone());

    bound.run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
