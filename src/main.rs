use anyhow::{Context, Result};
use skycast_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let (config, _validation) = Config::load_validated().context("Failed to load configuration")?;

    tracing::info!(
        "SkyCast starting (upstream: {}, archive: {})",
        config.upstream.base_url,
        config.archive.directory.display()
    );

    skycast_web::serve(&config).await?;

    Ok(())
}
