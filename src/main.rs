//! tracelink service binary
//!
//! ```text
//!   client ──▶ user service (:8001) ──traceparent──▶ catalog service (:8002)
//!                   │                                      │
//!                   └──────── spans of one trace ──────────┘
//! ```
//!
//! Runs either role. Configuration comes from an optional TOML file,
//! environment overrides and the command line, in that order.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;

use tracelink::config::load_config;
use tracelink::http::span_sink;
use tracelink::observability::{logging, metrics};
use tracelink::{ServiceRole, ServiceServer, Shutdown};

#[derive(Parser)]
#[command(name = "tracelink", version, about = "Traced catalog and user services")]
struct Cli {
    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Subcommand)]
enum RoleCommand {
    /// Run the catalog service
    Catalog(ServeArgs),
    /// Run the user service
    User(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides config and environment
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let (role, args) = match cli.role {
        RoleCommand::Catalog(args) => (ServiceRole::Catalog, args),
        RoleCommand::User(args) => (ServiceRole::User, args),
    };

    let mut config = load_config(args.config.as_deref(), role)?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        "tracelink starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        export_spans = config.tracing.export_spans,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = ServiceServer::new(config.clone(), span_sink(&config.tracing))?;

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    shutdown.on_signal();
    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
