use std::net::SocketAddr;
use std::sync::Arc;

use complaint_analytics::{
    AppState, app,
    config::{AppConfig, Constants},
    db::MongoStore,
    error::AnalyticsResult,
};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> AnalyticsResult<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Constants::DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = MongoStore::connect(&config).await?;
    let state = AppState::new(Arc::new(store), &config.jwt_secret);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
