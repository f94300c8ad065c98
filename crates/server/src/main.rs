use std::sync::Arc;

use anyhow::Context;
use boxbridge_files::FebboxClient;
use boxbridge_metadata::ShowboxClient;
use boxbridge_server::config::ServerConfig;
use boxbridge_server::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env().context("failed to read configuration")?;
    info!(
        metadata_url = %config.metadata.api_url,
        files_url = %config.files.base_url,
        timeout_secs = config.files.timeout.as_secs(),
        has_cookie = config.files.cookie.is_some(),
        "upstreams configured"
    );

    let metadata =
        ShowboxClient::new(config.metadata).context("failed to build metadata client")?;
    let files = FebboxClient::new(config.files).context("failed to build file service client")?;

    let app_state = AppState::new(Arc::new(metadata), Arc::new(files));
    let app = boxbridge_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
