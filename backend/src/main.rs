//! Kitchen ERP - Backend Server
//!
//! HTTP API over materials, location inventory, transfer orders,
//! notifications and the external inventory sync.

use std::net::SocketAddr;

use kitchen_erp_backend::{build_state, create_app, init_tracing, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    init_tracing("erp_server=debug,kitchen_erp_backend=debug,tower_http=debug,sqlx=warn");
    let config = Config::load()?;

    tracing::info!("Starting Kitchen ERP Server");
    tracing::info!("Environment: {}", config.environment);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = build_state(config).await?;

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
