use anyhow::Context;

use larder_api::app::{self, AppServices};
use larder_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    larder_observability::init();

    let config = ApiConfig::from_env().context("invalid configuration")?;
    let services = AppServices::from_config(&config)
        .await
        .context("failed to wire services")?;

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
