use anyhow::Context;
use tokio::net::TcpListener;

use crudlayer_server::{Settings, build_app, connect_store, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load settings")?;
    telemetry::init(&settings.telemetry);

    tracing::info!(
        store = ?settings.store.backend,
        page_size = settings.search.page_size,
        "crudlayer-server starting"
    );

    let store = connect_store(&settings).await?;
    let app = build_app(store, &settings).await?;

    let address = settings.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(%address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .with_context(|| "server error")?;

    tracing::info!("crudlayer-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
