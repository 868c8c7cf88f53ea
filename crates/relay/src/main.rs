//! 广播中继入口

use config::RelayConfig;
use relay::{serve, ConnectionRegistry, RelayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::load()?;
    bootstrap::init_tracing(&config.log);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    let state = RelayState::new(ConnectionRegistry::new(), config.exclude_sender);

    tracing::info!(
        port = config.server.port,
        exclude_sender = config.exclude_sender,
        "Websocket server listening on port {}",
        config.server.port
    );
    serve(listener, state, bootstrap::shutdown_signal()).await?;

    Ok(())
}
