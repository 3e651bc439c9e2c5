use actix_web::web;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

pub async fn run() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(|e| std::io::Error::other(e.to_string()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let state = bootstrap::setup(config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize");
        std::io::Error::other(e.to_string())
    })?;
    let state = web::Data::new(state);

    tracing::info!(
        host = %state.config.host,
        port = state.config.port,
        "Starting CSV curator"
    );
    start_server(state)?.await
}
