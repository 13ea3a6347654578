use anyhow::Context;
use catalog_server::{Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = setup_environment();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Relux catalog server starting");

    let state = ServerState::initialize(&config)
        .await
        .context("Failed to initialize server state")?;

    Server::with_state(config, state).run().await
}
