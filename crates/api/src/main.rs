//! Herald relay binary entrypoint.

use std::net::SocketAddr;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use herald_common::config::AppConfig;
use herald_engine::UsernameMap;

use herald_api::routes::create_router;
use herald_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "herald_api=debug,herald_engine=debug,herald_notifier=info,tower_http=debug",
            )
        }))
        .init();

    tracing::info!("Starting herald relay...");

    // Load configuration (also pulls in .env, so do it before reading the mapping)
    let config = AppConfig::from_env()?;
    let usernames = UsernameMap::shared();

    let port = config.port;
    let webhook_path = config.webhook_path.clone();
    let state = AppState::new(config, usernames);

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, %webhook_path, "Relay listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    tracing::info!("Herald relay stopped.");
    Ok(())
}
