use std::env;
use std::time::Duration;

use attendance_payroll::api::{AppState, create_router};
use attendance_payroll::config::ConfigLoader;
use tracing::info;

const CONFIG_ENV: &str = "ATTENDANCE_PAYROLL_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config/engine.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let path = env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = ConfigLoader::load(&path)?.into_config();
    info!(config = %path, "Loaded engine configuration");

    let state = AppState::in_memory(&config);
    state.spawn_pending_purge(Duration::from_secs(config.review.purge_interval_secs));
    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    info!(address = %config.server.bind_address, "Server starting...");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
