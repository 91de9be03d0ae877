//! CORS-injecting relay in front of a single upstream API.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 CORS RELAY                    │
//!                    │                                               │
//!   Client Request   │  ┌─────────┐    ┌────────────────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│ OPTIONS? answer locally │   │
//!                    │  │ server  │    └───────────┬────────────┘   │
//!                    │  └─────────┘                │                 │
//!                    │                             ▼                 │
//!                    │                   ┌──────────────────┐        │
//!                    │                   │ forward dispatch │        │
//!                    │                   │ standard │ upload │        │
//!                    │                   └────────┬─────────┘        │
//!                    │                            │                  │
//!   Client Response  │  ┌──────────┐              ▼                  │
//!   ◀────────────────┼──│ CORS     │◀──────── upstream API ◀─────────┼──── Upstream
//!                    │  │ headers  │                                 │     Server
//!                    │  └──────────┘                                 │
//!                    └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cors_relay::config::loader::{self, CliArgs};
use cors_relay::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cors_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("cors-relay v0.1.0 starting");

    let args = CliArgs::parse();
    let config = loader::resolve(&args)?;

    tracing::info!(
        upstream = %config.upstream.base_url,
        bind_address = %config.listener.bind_address(),
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;

    if config.listener.host == "0.0.0.0" {
        tracing::info!(
            port = config.listener.port,
            "Point your API client at any reachable address of this host"
        );
    } else {
        tracing::info!("Point your API client at http://{}", local_addr);
    }

    // Create and run HTTP server
    let server = HttpServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
