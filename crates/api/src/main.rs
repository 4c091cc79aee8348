use anyhow::Context;

use pharmstock_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pharmstock_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let app = pharmstock_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        expiry_horizon_days = config.expiry_horizon.as_days(),
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
