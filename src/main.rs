use std::net::SocketAddr;

use anyhow::Result;
use feedproxy::app_state::AppState;
use feedproxy::config::Config;
use feedproxy::refresh::Refresher;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("feedproxy=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr(),
        sources = config.sources().len(),
        cache_ttl_secs = config.cache_ttl_secs(),
        tls_exempt_hosts = ?config.tls_exempt_hosts(),
        "starting feedproxy"
    );

    let state = AppState::new(config);
    let shutdown = CancellationToken::new();

    // Ctrl-C flips the token; the server and the refresher both watch it.
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for shutdown signal");
                return;
            }
            info!("received shutdown signal, finishing in-flight requests");
            shutdown.cancel();
        });
    }

    let refresher = tokio::spawn(Refresher::new(state.clone(), shutdown.clone()).run());

    let app = feedproxy::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown({
        let shutdown = shutdown.clone();
        async move { shutdown.cancelled().await }
    })
    .await?;

    let _ = refresher.await;
    info!("feedproxy stopped");
    Ok(())
}
