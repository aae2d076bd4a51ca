//! koifox - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the exam analysis API.

use koifox::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "koifox=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Loaded configuration: ocr_model={} answer_model={}",
        config.ocr_model, config.answer_model
    );

    api::serve(config).await?;

    Ok(())
}
