use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use movie_streams_api::{
    api::{create_router, AppState},
    catalog::{load_catalog_dir, Catalog},
    config::Config,
    services::HttpProber,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // An empty or missing catalog aborts startup
    let records = load_catalog_dir(&config.catalog_dir, &config.catalog_file_marker)
        .context("Failed to load movie catalog")?;
    let catalog = Catalog::new(records).context("Failed to index movie catalog")?;

    let prober = HttpProber::new(config.probe_timeout())?;
    let state = AppState::new(catalog, Arc::new(prober), &config);

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        probe_timeout_ms = config.probe_timeout_ms,
        "Addon server running"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
