use anyhow::Context;
use beamcast_server::{RelayConfig, router, spawn_relay};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RelayConfig::parse();
    info!("Initializing relay with {:?}", config.relay_settings());

    let service = spawn_relay(
        config.relay_settings(),
        config.ice_server_configs(),
        config.command_buffer,
    );
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("Signaling relay listening on ws://{}/ws", config.bind);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
