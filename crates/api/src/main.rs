use anyhow::Context;

use foodlabel_api::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    foodlabel_observability::init();

    let config = ApiConfig::from_env()?;
    let bind_addr = config.bind_addr;

    let app = foodlabel_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
