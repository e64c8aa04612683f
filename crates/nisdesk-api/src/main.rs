//! nisdesk API server entrypoint.

use tracing_subscriber::EnvFilter;

use nisdesk_api::state::{AppConfig, AppState};
use nisdesk_api::{app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let pool = db::init_pool().await?;
    let state = AppState::with_config(config.clone(), pool.clone());
    if let Some(pool) = &pool {
        db::hydrate(&state, pool).await?;
    } else {
        tracing::warn!("DATABASE_URL not set — running with in-memory storage only");
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("nisdesk-api listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state).into_make_service()).await?;
    Ok(())
}
