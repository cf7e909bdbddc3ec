use anyhow::Result;
use fitness_tracker::api::{create_routes, AppState};
use fitness_tracker::config::{init_tracing, AppConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.log_level)?;

    info!(
        environment = %config.environment,
        storage = config.storage_backend.as_str(),
        "Starting fitness tracker API"
    );

    let state = AppState::from_config(&config).await?;
    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Fitness tracker server listening on http://{}", address);
    info!("Health check available at http://{}/api/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
