use anyhow::Context;
use api_server::{router, AppState};
use application::AlumniApp;
use config::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env(None)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    info!("Starting Alumni Link API server");
    info!(database = %config.database_path, "using database");

    let app = AlumniApp::new(&config).context("failed to initialise application")?;
    let app = router(AppState { app: Arc::new(app) });

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    info!("API server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
